pub mod classification;
pub mod email;
pub mod ticket;
