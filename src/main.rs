use env_logger::Env;
use subword_dict::Pipeline;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    Pipeline::run();
}
