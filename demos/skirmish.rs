//! Headless skirmish: six units wandering a random field.
//!
//! Run: cargo run --bin skirmish -- --seed 7 --ticks 400

use clap::{Parser, value_parser};
use skirmish_demos::Skirmish;

/// Run a seeded skirmish and print a frame every `every` ticks.
#[derive(Debug, Parser)]
#[command(name = "skirmish", version)]
struct Args {
    /// Seed for terrain, spawn points and orders.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 240)]
    ticks: u32,

    /// Print a frame every this many ticks.
    #[arg(long, default_value_t = 40, value_parser = value_parser!(u32).range(1..))]
    every: u32,
}

fn main() {
    let args = Args::parse();

    let mut world = Skirmish::new(args.seed);
    print!("{}", world.frame());
    for _ in 0..args.ticks {
        world.tick();
        if world.ticks() % args.every == 0 {
            println!();
            print!("{}", world.frame());
        }
    }

    println!();
    for msg in world.messages() {
        println!("{msg}");
    }
}
