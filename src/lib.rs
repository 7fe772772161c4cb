pub mod arrivals;
pub mod error;
pub mod fetch;
pub mod matcher;
pub mod output;
pub mod parser;
pub mod routes;
pub mod session;
pub mod stations;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
