//! Operator Catalogue
//!
//! Thin constructors that plug one pure per-block kernel each into the
//! derived-node base contracts, instantiated for `f32`. A catalogue entry
//! declares only its arity, whether it carries a scalar operand, and (for
//! non-commutative shapes) which side the scalar occupies (encoded in the
//! kernel body, e.g. [`arithmetic::sub_scalar`] vs
//! [`arithmetic::scalar_sub`]). No entry contains graph logic.
//!
//! Kernels are straight per-lane loops over fixed-length slices; with the
//! block size at the host SIMD width they compile to one batched vector
//! operation per call.
//!
//! Entries are grouped by family and not re-exported flat: callers write
//! `ops::arithmetic::add(...)` and `ops::reduce::mean(...)`, so block and
//! reduction operators may share names (`min`, `max`).

pub mod arithmetic;
pub mod fused;
pub mod logical;
pub mod magnitude;
pub mod reduce;
pub mod transcendental;
