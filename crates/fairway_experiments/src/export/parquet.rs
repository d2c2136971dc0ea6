use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, UInt32Array, UInt64Array, UInt8Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use fairway_core::telemetry::OrderSample;

fn u32_field(name: &'static str) -> Field {
    Field::new(name, DataType::UInt32, false)
}

fn u64_field(name: &'static str) -> Field {
    Field::new(name, DataType::UInt64, false)
}

fn u8_field(name: &'static str) -> Field {
    Field::new(name, DataType::UInt8, false)
}

fn bool_field(name: &'static str) -> Field {
    Field::new(name, DataType::Boolean, false)
}

fn write_record_batch<P: AsRef<Path>>(
    path: P,
    schema: Schema,
    arrays: Vec<ArrayRef>,
) -> Result<(), Box<dyn Error>> {
    let schema = Arc::new(schema);
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Export per-order delivery rows for notebook analysis.
pub fn write_order_samples_parquet<P: AsRef<Path>>(
    path: P,
    samples: &[OrderSample],
) -> Result<(), Box<dyn Error>> {
    let mut order_ids = Vec::with_capacity(samples.len());
    let mut asset_ids = Vec::with_capacity(samples.len());
    let mut placed_ms = Vec::with_capacity(samples.len());
    let mut assigned_ms = Vec::with_capacity(samples.len());
    let mut picked_up_ms = Vec::with_capacity(samples.len());
    let mut delivered_ms = Vec::with_capacity(samples.len());
    let mut delivered_hole = Vec::with_capacity(samples.len());
    let mut batched = Vec::with_capacity(samples.len());

    for sample in samples {
        order_ids.push(sample.order_id);
        asset_ids.push(sample.asset_id);
        placed_ms.push(sample.placed_ms);
        assigned_ms.push(sample.assigned_ms);
        picked_up_ms.push(sample.picked_up_ms);
        delivered_ms.push(sample.delivered_ms);
        delivered_hole.push(sample.delivered_hole);
        batched.push(sample.batched);
    }

    let schema = Schema::new(vec![
        u32_field("order_id"),
        u32_field("asset_id"),
        u64_field("placed_ms"),
        u64_field("assigned_ms"),
        u64_field("picked_up_ms"),
        u64_field("delivered_ms"),
        u8_field("delivered_hole"),
        bool_field("batched"),
    ]);
    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from(order_ids)),
        Arc::new(UInt32Array::from(asset_ids)),
        Arc::new(UInt64Array::from(placed_ms)),
        Arc::new(UInt64Array::from(assigned_ms)),
        Arc::new(UInt64Array::from(picked_up_ms)),
        Arc::new(UInt64Array::from(delivered_ms)),
        Arc::new(UInt8Array::from(delivered_hole)),
        Arc::new(BooleanArray::from(batched)),
    ];
    write_record_batch(path, schema, arrays)
}
