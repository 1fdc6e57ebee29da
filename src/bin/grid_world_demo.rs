use gridmdp::{GridWorldConfig, Result};

fn main() -> Result<()> {
    let config = GridWorldConfig::default();
    let mut solver = config.build()?;

    println!("Initial Values:");
    println!("------------------------------------");
    println!("{}", solver.grid().display_values());

    solver.run(config.iterations)?;

    println!("Values after {} iterations.", config.iterations);
    println!("------------------------------------");
    println!("{}", solver.grid().display_values());

    println!("The policy on this map.");
    println!("------------------------------------");
    println!("{}", solver.grid().display_policy());

    Ok(())
}
