#![doc = include_str!("../README.md")]

mod array_macros;
