pub mod buffer;
pub mod buffer_count;
pub mod collect;
pub mod combine_latest;
pub mod distinct_until_changed;
pub mod element_at;
pub mod filter;
pub mod ignore_elements;
pub mod last;
pub mod map;
pub mod map_err;
pub mod merge;
pub mod merge_all;
pub mod observe_on;
pub mod on_complete;
pub mod on_error;
pub mod reduce;
pub mod scan;
pub mod skip;
pub mod skip_while;
pub mod start_with;
pub mod switch_latest;
pub mod take;
pub mod take_last;
pub mod take_while;
pub mod try_map;
pub mod window;
pub mod with_latest_from;
pub mod zip;

pub use window::WindowObservable;
