use std::{
    env, fs,
    io::{Write, stdout},
};

use lib_steam_appinfo::vdf;

fn main() {
    let path = env::args_os()
        .nth(1)
        .expect("usage: 04_serialize_appinfo_to_json <path to appinfo.vdf>");
    let bytes = fs::read(path).expect("failed to read appinfo.vdf");
    let appinfo = vdf::decode(&bytes).expect("failed to decode appinfo.vdf");

    let serialized = serde_json::to_string_pretty(&appinfo).expect("failed to serialize appinfo");
    let mut stdout = stdout().lock();
    writeln!(&mut stdout, "{serialized}").expect("failed to write to stdout");
}
