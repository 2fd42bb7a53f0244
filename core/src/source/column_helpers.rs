use datafusion::arrow::array::{Array, LargeStringArray, StringArray, StringViewArray};
use datafusion::arrow::record_batch::RecordBatch;

// ─────────────────────────────────────────────────────────────────────────────
// Column Extractors (handles Arrow string type variations automatically)
// ─────────────────────────────────────────────────────────────────────────────

fn collect<'a>(
    len: usize,
    is_null: impl Fn(usize) -> bool,
    value: impl Fn(usize) -> &'a str,
) -> Vec<Option<String>> {
    (0..len)
        .map(|i| (!is_null(i)).then(|| value(i).to_string()))
        .collect()
}

/// Nullable text column. Nulls come back as `None`.
pub fn col_opt_strings(batch: &RecordBatch, idx: usize) -> Result<Vec<Option<String>>, String> {
    let col = batch.column(idx);
    if let Some(a) = col.as_any().downcast_ref::<StringViewArray>() {
        return Ok(collect(a.len(), |i| a.is_null(i), |i| a.value(i)));
    }
    if let Some(a) = col.as_any().downcast_ref::<StringArray>() {
        return Ok(collect(a.len(), |i| a.is_null(i), |i| a.value(i)));
    }
    if let Some(a) = col.as_any().downcast_ref::<LargeStringArray>() {
        return Ok(collect(a.len(), |i| a.is_null(i), |i| a.value(i)));
    }
    Err(format!(
        "col {idx}: expected string, got {:?}",
        col.data_type()
    ))
}
