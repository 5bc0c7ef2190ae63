use log::{error, info};
use crate::initialization::init;

mod calendar;
mod config;
mod errors;
mod initialization;
mod manager_open_meteo;
mod manager_owm;
mod manager_sun;
mod manager_tides;
mod models;
mod photo_times;
mod streaks;
mod warnings;
mod worker;

fn main() {
    let (config, mgr) = match init() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    let failed = worker::run(&config, &mgr);
    if failed > 0 {
        error!("{} job(s) failed", failed);
    } else {
        info!("all jobs done");
    }
}
