pub mod forecast;
pub mod retain;
pub mod run;
pub mod seasonal;
