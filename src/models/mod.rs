pub mod datasource;
pub mod kairos;
pub mod panel;
