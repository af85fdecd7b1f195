use std::fs;
use std::path::{Path, PathBuf};

use dsgen_core::{OutputConfig, RowFormat, Session, Table};
use dsgen_generate::{
    Driver, FileSink, GenerationError, GenerationRequest, RowGroup, RowGroups, RowProducer,
    SyntheticRowProducer, TableGenerator, TableStatus,
};

struct FixedProducer(Vec<RowGroup>);

impl RowProducer for FixedProducer {
    fn produce<'a>(&'a self, request: &GenerationRequest) -> RowGroups<'a> {
        let range = request.range;
        Box::new(
            self.0
                .iter()
                .filter(move |group| range.contains(group.row_number))
                .cloned()
                .map(Ok),
        )
    }
}

fn temp_out_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("dsgen_generate_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp out dir");
    dir
}

fn output(dir: &Path, family_run: bool) -> OutputConfig {
    OutputConfig {
        target_directory: dir.display().to_string(),
        separator: std::path::MAIN_SEPARATOR.to_string(),
        suffix: ".dat".to_string(),
        family_run,
    }
}

fn session(dir: &Path) -> Session {
    Session {
        scale: 0.001,
        target_directory: dir.display().to_string(),
        table: Some(Table::StoreSales),
        ..Session::default()
    }
}

fn producer(session: &Session) -> SyntheticRowProducer {
    SyntheticRowProducer::new(session.seed, session.scale, session.row_format())
}

#[test]
fn files_are_written_as_latin1() {
    let dir = temp_out_dir("latin1");
    let producer = FixedProducer(vec![
        RowGroup::new(1, "caf\u{e9}|\n"),
        RowGroup::new(2, "\u{20ac}5|\n"),
    ]);
    let generator = TableGenerator::new(producer, FileSink::new(), output(&dir, true));

    generator
        .generate_table(Table::Reason, 1, 2)
        .expect("generate reason");

    let bytes = fs::read(dir.join("reason.dat")).expect("read reason.dat");
    assert_eq!(bytes, b"caf\xe9|\n?5|\n".to_vec());
}

#[test]
fn repeated_calls_append_to_files() {
    let dir = temp_out_dir("append");
    let producer = SyntheticRowProducer::new(3, 1.0, RowFormat::default());
    let generator = TableGenerator::new(&producer, FileSink::new(), output(&dir, true));

    generator
        .generate_table(Table::WebSales, 1, 60)
        .expect("first half");
    generator
        .generate_table(Table::WebSales, 61, 120)
        .expect("second half");

    let whole_dir = temp_out_dir("append_whole");
    let generator = TableGenerator::new(&producer, FileSink::new(), output(&whole_dir, true));
    generator
        .generate_table(Table::WebSales, 1, 120)
        .expect("whole range");

    for name in ["web_sales.dat", "web_returns.dat"] {
        assert_eq!(
            fs::read(dir.join(name)).expect("read split"),
            fs::read(whole_dir.join(name)).expect("read whole"),
            "{name} differs"
        );
    }
    let parent = fs::read_to_string(dir.join("web_sales.dat")).expect("read web_sales");
    assert_eq!(parent.lines().count(), 120);
}

#[test]
fn missing_directory_is_an_open_failure() {
    let dir = temp_out_dir("missing").join("does_not_exist");
    let producer = SyntheticRowProducer::new(3, 1.0, RowFormat::default());
    let generator = TableGenerator::new(producer, FileSink::new(), output(&dir, true));

    let err = generator
        .generate_table(Table::Store, 1, 3)
        .expect_err("directory is missing");

    assert!(matches!(
        err,
        GenerationError::DestinationOpen {
            table: Table::Store,
            ..
        }
    ));
}

#[test]
fn sharded_run_concatenates_to_unsharded_run() {
    let whole_dir = temp_out_dir("whole");
    let whole = session(&whole_dir);
    let report = Driver::new(producer(&whole), FileSink::new())
        .run(&whole)
        .expect("unsharded run");
    assert_eq!(report.tables.len(), 1);
    assert_eq!(report.tables[0].locations.len(), 2);

    let shard_dir = temp_out_dir("shards");
    let sharded = Session {
        parallelism: 3,
        generate_all_chunks: true,
        ..session(&shard_dir)
    };
    let report = Driver::new(producer(&sharded), FileSink::new())
        .run(&sharded)
        .expect("sharded run");
    assert_eq!(report.generated().count(), 3);

    for name in ["store_sales", "store_returns"] {
        let mut concatenated = Vec::new();
        for chunk in 1..=3 {
            let path = shard_dir.join(format!("{name}_{chunk}_3.dat"));
            concatenated.extend(fs::read(&path).expect("read shard"));
        }
        let whole = fs::read(whole_dir.join(format!("{name}.dat"))).expect("read whole");
        assert_eq!(concatenated, whole, "{name} shards differ from the full run");
    }
}

#[test]
fn single_chunk_writes_only_its_range() {
    let dir = temp_out_dir("chunk");
    let session = Session {
        table: Some(Table::Item),
        parallelism: 4,
        chunk_number: 2,
        ..session(&dir)
    };
    let report = Driver::new(producer(&session), FileSink::new())
        .run(&session)
        .expect("chunk run");

    // item has 18 rows at this scale: chunks of 4, the last takes 6.
    let range = report.tables[0].range;
    assert_eq!((range.start, range.end), (5, 8));
    let content = fs::read_to_string(dir.join("item_2_4.dat")).expect("read chunk");
    let first_keys: Vec<&str> = content
        .lines()
        .filter_map(|line| line.split('|').next())
        .collect();
    assert_eq!(first_keys, vec!["5", "6", "7", "8"]);
}

#[test]
fn overwrite_replaces_previous_output() {
    let dir = temp_out_dir("overwrite");
    let appended = session(&dir);
    let driver = Driver::new(producer(&appended), FileSink::new());
    driver.run(&appended).expect("first run");
    let once = fs::read(dir.join("store_sales.dat")).expect("read first run");

    driver.run(&appended).expect("appending run");
    let twice = fs::read(dir.join("store_sales.dat")).expect("read appended");
    assert_eq!(twice.len(), once.len() * 2);

    let overwrite = Session {
        overwrite: true,
        ..appended
    };
    driver.run(&overwrite).expect("overwrite run");
    let replaced = fs::read(dir.join("store_sales.dat")).expect("read replaced");
    assert_eq!(replaced, once);
}

#[test]
fn child_table_outside_family_run_is_reported_as_skipped() {
    let dir = temp_out_dir("skip");
    let session = Session {
        table: Some(Table::StoreReturns),
        family_run: false,
        ..session(&dir)
    };
    let report = Driver::new(producer(&session), FileSink::new())
        .run(&session)
        .expect("skip run");

    assert_eq!(report.tables.len(), 1);
    assert_eq!(report.tables[0].status, TableStatus::Skipped);
    assert!(!dir.join("store_returns.dat").exists());
}

#[test]
fn invalid_session_is_rejected_before_writing() {
    let dir = temp_out_dir("invalid");
    let session = Session {
        parallelism: 2,
        chunk_number: 3,
        ..session(&dir)
    };
    let err = Driver::new(producer(&session), FileSink::new())
        .run(&session)
        .expect_err("invalid chunk");

    assert!(matches!(err, GenerationError::Core(_)));
    assert_eq!(fs::read_dir(&dir).expect("read dir").count(), 0);
}

#[test]
fn run_report_serializes_to_json() {
    let dir = temp_out_dir("report");
    let session = Session {
        table: Some(Table::CallCenter),
        ..session(&dir)
    };
    let report = Driver::new(producer(&session), FileSink::new())
        .run(&session)
        .expect("run");

    let json = serde_json::to_value(&report).expect("serialize report");
    let tables = json
        .get("tables")
        .and_then(|value| value.as_array())
        .expect("tables array");
    assert_eq!(tables[0].get("table"), Some(&serde_json::json!("call_center")));
    assert_eq!(tables[0].get("status"), Some(&serde_json::json!("generated")));
    assert_eq!(
        tables[0].get("range"),
        Some(&serde_json::json!({ "start": 1, "end": 1 }))
    );
}

#[test]
fn requested_child_table_matches_family_run_file() {
    let family_dir = temp_out_dir("family");
    let family = session(&family_dir);
    Driver::new(producer(&family), FileSink::new())
        .run(&family)
        .expect("family run");

    let child_dir = temp_out_dir("child");
    let child = Session {
        table: Some(Table::StoreReturns),
        ..session(&child_dir)
    };
    let report = Driver::new(producer(&child), FileSink::new())
        .run(&child)
        .expect("child run");

    assert_eq!(report.tables[0].status, TableStatus::Generated);
    assert_eq!(report.tables[0].locations.len(), 1);
    assert!(!child_dir.join("store_sales.dat").exists());
    assert_eq!(
        fs::read(child_dir.join("store_returns.dat")).expect("read child run"),
        fs::read(family_dir.join("store_returns.dat")).expect("read family run")
    );
}
