use anyhow::{ Context, Result };
use log::info;

use tensorprobe::{
  plot::{ visualize, TerminalPlotter },
  Instrumentation, MiniMlp, TrainConfig, train,
};


fn main() -> Result<()> {
  env_logger::init();

  let inst = Instrumentation::default();

  let mut model = MiniMlp::new();
  model.fc1.register_forward_hook(inst.activation_probe("fc1"));
  model.fc2.register_forward_hook(inst.activation_probe("fc2"));

  let losses = train(&model, &TrainConfig::epochs(3), &inst, &mut rand::thread_rng());
  info!("final loss {:?}", losses.last());

  visualize(&inst.captures(), inst.console(), &mut TerminalPlotter::default())
    .context("Failed to display histograms")?;

  Ok(())
}
