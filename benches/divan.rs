use divan::AllocProfiler;
use lib_steam_appinfo::vdf::{self, AppInfoFile, AppRecord, FormatVersion, KvContainer, KvValue};

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

fn synthetic_appinfo(records: u32) -> Vec<u8> {
    let mut file = AppInfoFile::new(FormatVersion::V29, 1);
    for app_id in 1..=records {
        file.push(AppRecord::new(
            app_id,
            KvContainer::new().with(
                "common",
                KvValue::Container(KvContainer::new().with("name", KvValue::String("Some App".into()))),
            ),
        ));
    }

    file.to_bytes()
}

// Memory usage of decoding grows with the number of records
#[divan::bench(args = [100, 1000, 10000])]
fn bench_decode(bencher: divan::Bencher, records: u32) {
    let bytes = synthetic_appinfo(records);
    bencher.bench(|| vdf::decode(divan::black_box(&bytes)));
}

// Rough idea of overall speed and memory usage on the current machine
#[cfg(target_os = "linux")]
#[divan::bench(sample_size = 100)]
fn bench_all() {
    let detector = lib_steam_appinfo::get_detector();
    detector.get_detected_launchers();
    detector.get_all_detected_games();
    detector.get_all_detected_games_per_launcher();
    detector.get_all_detected_games_with_box_art();
}
