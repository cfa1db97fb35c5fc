// Draft order and pick allocation.

pub mod allocator;
pub mod order;
pub mod pool;
pub mod simulator;
pub mod slot;
