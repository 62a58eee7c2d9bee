use micrograd::nn::{Mlp, Module};
use micrograd::Tape;

use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() {
  env_logger::init();

  let tape = Tape::new();
  let mut rng = StdRng::seed_from_u64(42);
  let mlp = Mlp::new(&tape, 3, &[4, 4, 1], &mut rng);
  println!("{}", mlp);

  let output = match mlp.forward_values(&[1.0, -2.0, 3.0]) {
    Ok(output) => output,
    Err(err) => {
      eprintln!("forward pass failed: {}", err);
      std::process::exit(1);
    }
  };
  output[0].backward();

  print!("Output: ");
  for val in &output {
    print!("{} ", val);
  }
  println!();

  println!("Parameters after backward():");
  for param in mlp.parameters() {
    println!("{}", param);
  }

  mlp.zero_grad();
  println!("After zero_grad():");
  for param in mlp.parameters() {
    println!("{}", param);
  }
}
