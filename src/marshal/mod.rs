//! Host side of the wasm-bindgen calling convention: strings and byte
//! buffers travel as `(ptr, len)` pairs in guest memory, and vectors come back
//! through a slot on the guest's shadow stack.

pub mod alloc;
pub mod memory;
pub mod pass;
pub mod stack;
pub mod vec;

pub use alloc::*;
pub use memory::*;
pub use pass::*;
pub use stack::*;
pub use vec::*;
