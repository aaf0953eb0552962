// Standard library modules
pub mod string;
