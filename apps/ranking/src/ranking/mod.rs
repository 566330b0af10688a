pub mod bias;
pub mod handlers;
pub mod lock;
pub mod model;
pub mod service;
