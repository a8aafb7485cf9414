// Utility Module
// File helpers used by the command line driver

pub mod file_ops;
