pub mod fund;
pub mod price;
pub mod setup;
pub mod status;
pub mod ui;
pub mod withdraw;
