mod max_pool_2d;

pub use max_pool_2d::MaxPool2D;
