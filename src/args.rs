use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Photo of the dish with a hand in frame
    pub image: String,

    /// Real-world hand length, wrist to middle fingertip (cm, 15-25)
    #[arg(long)]
    pub hand_length_cm: f32,

    /// How full the container is (0.3-1.0)
    #[arg(long, default_value_t = 0.55)]
    pub bowl_factor: f32,

    /// Container type; only "bowl" changes the formula
    #[arg(long, default_value = "bowl")]
    pub dish_type: String,

    /// Artifact key override (default: wall-clock timestamp)
    #[arg(long)]
    pub key: Option<String>,

    /// Also write the hand-calibration annotation image
    #[arg(long, default_value_t = false)]
    pub annotate: bool,

    /// Print the estimate as JSON instead of a table
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Config file path
    #[arg(long, default_value = "config.json")]
    pub config: String,
}
