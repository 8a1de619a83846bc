use std::fmt::Display;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FrameError
{
    CgDidNotConverge,
    PowerIterationDidNotConverge,
    SingularLocalSystem,
}
impl std::error::Error for FrameError {}

impl Display for FrameError
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", *self)
    }
}
