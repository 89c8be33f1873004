use crate::ops::{last::LastOp, scan::ScanOp};

/// `reduce` is a `scan` whose intermediate states are dropped: only the
/// final accumulator is kept, and the seed stands in when the source is
/// empty.
pub type ReduceOp<S, F, Acc, Item> = LastOp<ScanOp<S, F, Acc, Item>, Acc>;
