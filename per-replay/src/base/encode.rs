//! Encoding of states into fixed-length numeric vectors.

/// A state that can be turned into a vector of `f64`.
///
/// Replay buffers only store encoded states. The encoder lives outside of this
/// crate, typically next to the environment that produces the states.
///
/// # Examples
///
/// ```rust
/// use per_replay::Encode;
///
/// struct CartPoleState {
///     x: f64,
///     theta: f64,
/// }
///
/// impl Encode for CartPoleState {
///     const DIMENSION: usize = 2;
///
///     fn encode(&self) -> Vec<f64> {
///         vec![self.x, self.theta]
///     }
/// }
/// ```
pub trait Encode {
    /// Length of the vector returned by [`Encode::encode`].
    const DIMENSION: usize;

    /// Encodes the state.
    ///
    /// The result must have exactly [`Encode::DIMENSION`] elements and must be
    /// deterministic for a given state.
    fn encode(&self) -> Vec<f64>;
}
