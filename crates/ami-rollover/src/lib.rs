//! ami-rollover - blue/green replacement of EC2 instances behind a classic ELB
//!
//! Finds the running instances of an old machine image, launches a
//! replacement for each from a new image, swaps them in on the load balancer
//! once healthy and terminates the old ones.

pub mod aws;
pub mod config;
pub mod deploy;
pub mod wait;
