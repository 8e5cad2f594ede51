use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Invariant violations raised by the schedule passes.
///
/// All of these are fatal for the invocation: the passes verify a schedule
/// that upstream validation already accepted, so any failure here means an
/// inconsistent stage/bound-map pair or a bug in an earlier pass. Callers
/// abort the compilation; nothing is retried.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("no binding for loop variable {var} in the bound map"))]
    MissingBinding { var: String },

    #[snafu(display("split domain of {var} must be zero-based, found min {min}"))]
    NonZeroBase { var: String, min: String },

    #[snafu(display("no loop found for variable {var}"))]
    LoopNotFound { var: String },

    #[snafu(display("fuse target {inner} is not nested under {outer}"))]
    FuseScope { inner: String, outer: String },

    #[snafu(display("cannot reorder: tree has {current} loops but the required order has {required}"))]
    LoopCountMismatch { current: usize, required: usize },

    #[snafu(display("loop variable {var} must appear in exactly one loop, found {found}"))]
    LoopMultiplicity { var: String, found: usize },

    #[snafu(display("current and required loop orders are inconsistent: no loop is out of order"))]
    NoOutOfOrderLoop,

    #[snafu(display("loop reorder did not converge after {iterations} moves over {loops} loops"))]
    ReorderDiverged { iterations: usize, loops: usize },

    #[snafu(display("no domain for {var}: neither its own range nor a bound-map entry is defined"))]
    UndefinedDomain { var: String },

    #[snafu(display("thread extent {declared} and loop extent {actual} mismatch for {var}"))]
    ThreadExtentMismatch { var: String, declared: String, actual: String },

    #[snafu(display("pragma keys and values disagree in length: {keys} keys, {values} values"))]
    PragmaArity { keys: usize, values: usize },
}
