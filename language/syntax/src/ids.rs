/// Stable handle into `Registry::functions`. Functions never move once
/// pushed, so the index doubles as an identity that survives generic
/// materialization and inheritance propagation without any pointer
/// chasing back into a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

/// Stable handle into `Registry::objects`, same rationale as `FunctionId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);
