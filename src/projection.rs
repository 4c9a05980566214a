//! Derived read models computed from a store snapshot.

/// A read model derived from a snapshot of `S`.
///
/// Projections are recomputed from the full snapshot every time they are
/// read, so a projection can never lag behind its source.
///
/// # Contract
///
/// - [`project`](Projection::project) must be deterministic: the same
///   snapshot always yields the same value.
pub trait Projection<S>: Sized {
    /// Human-readable name, used in log fields.
    const NAME: &'static str;

    /// Derive the read model from `state`.
    fn project(state: &S) -> Self;
}
