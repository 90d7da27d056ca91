pub mod annotation;
pub mod association;
pub mod image_reference;
pub mod moment;
pub mod observation;
