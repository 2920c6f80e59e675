use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use bb_core::RunSubrunPair;
use bb_scan::scan_subruns;

fn write_parquet(path: &PathBuf, batch: RecordBatch) {
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn subrun_batch(rows: &[(i64, i64, f64)]) -> RecordBatch {
    let runs: Int64Array = rows.iter().map(|r| Some(r.0)).collect();
    let subruns: Int64Array = rows.iter().map(|r| Some(r.1)).collect();
    let pots: Float64Array = rows.iter().map(|r| Some(r.2)).collect();
    let schema = Arc::new(Schema::new(vec![
        Field::new("run", DataType::Int64, false),
        Field::new("subrun", DataType::Int64, false),
        Field::new("pot", DataType::Float64, false),
    ]));
    RecordBatch::try_new(
        schema,
        vec![Arc::new(runs) as ArrayRef, Arc::new(subruns), Arc::new(pots)],
    )
    .unwrap()
}

#[test]
fn dedups_pairs_and_takes_first_pot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.parquet");
    // (1,1) appears three times with the same POT; only the first counts.
    write_parquet(
        &path,
        subrun_batch(&[
            (2, 5, 30.0),
            (1, 1, 10.0),
            (1, 1, 10.0),
            (1, 2, 20.0),
            (1, 1, 10.0),
        ]),
    );

    let scan = scan_subruns(&[path]).unwrap();
    assert_eq!(scan.n_entries, 5);
    assert_eq!(scan.pot_sum, 60.0);
    let pairs: Vec<_> = scan.unique_pairs.iter().copied().collect();
    assert_eq!(
        pairs,
        vec![
            RunSubrunPair::new(1, 1),
            RunSubrunPair::new(1, 2),
            RunSubrunPair::new(2, 5),
        ]
    );
}

#[test]
fn dedups_across_files_first_observation_wins() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.parquet");
    let b = dir.path().join("b.parquet");
    write_parquet(&a, subrun_batch(&[(1, 1, 10.0)]));
    // Same pair in a second file with a different POT: the first file's
    // value stands and the duplicate only shows up in n_entries.
    write_parquet(&b, subrun_batch(&[(1, 1, 99.0), (1, 2, 5.0)]));

    let scan = scan_subruns(&[a, b]).unwrap();
    assert_eq!(scan.unique_pairs.len(), 2);
    assert_eq!(scan.pot_sum, 15.0);
    assert_eq!(scan.n_entries, 3);
}

#[test]
fn file_without_subrun_columns_contributes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let events = dir.path().join("events.parquet");
    let other = dir.path().join("other.parquet");
    write_parquet(&events, subrun_batch(&[(3, 1, 7.0)]));

    let names: StringArray = ["x", "y"].iter().map(|s| Some(*s)).collect();
    let schema = Arc::new(Schema::new(vec![Field::new("name", DataType::Utf8, false)]));
    let batch = RecordBatch::try_new(schema, vec![Arc::new(names) as ArrayRef]).unwrap();
    write_parquet(&other, batch);

    let scan = scan_subruns(&[events, other]).unwrap();
    assert_eq!(scan.unique_pairs.len(), 1);
    assert_eq!(scan.pot_sum, 7.0);
    assert_eq!(scan.n_entries, 1);
}

#[test]
fn missing_pot_column_sums_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.parquet");
    let runs = Int64Array::from(vec![4, 4]);
    let subruns = Int64Array::from(vec![1, 2]);
    let schema = Arc::new(Schema::new(vec![
        Field::new("run", DataType::Int64, false),
        Field::new("subrun", DataType::Int64, false),
    ]));
    let batch =
        RecordBatch::try_new(schema, vec![Arc::new(runs) as ArrayRef, Arc::new(subruns)]).unwrap();
    write_parquet(&path, batch);

    let scan = scan_subruns(&[path]).unwrap();
    assert_eq!(scan.unique_pairs.len(), 2);
    assert_eq!(scan.pot_sum, 0.0);
}

#[test]
fn empty_file_list_is_rejected() {
    let err = scan_subruns(&[]).unwrap_err();
    assert!(err.to_string().contains("at least one input file"));
}

#[test]
fn unopenable_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does_not_exist.parquet");
    assert!(scan_subruns(&[missing]).is_err());
}
