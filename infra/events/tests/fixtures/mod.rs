#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestEvent(pub usize);
