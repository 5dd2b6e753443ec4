pub mod oracle;
pub mod postgres;
