use serde_json::{json, Value};

use crate::encode::EncodeReport;

/// Renders 'report' as a JSON object, adding the bit rates that size comparisons use:
/// connectivity bits per face and attribute bits per vertex.
pub fn report_to_json(report: &EncodeReport) -> Value {
    let num_vertices = report.vertex_order.len();
    let mut value = serde_json::to_value(report).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        // the permutation is as long as the mesh, and says nothing about size.
        map.remove("vertex_order");
        map.insert("num_vertices".to_owned(), json!(num_vertices));
        map.insert("connectivity_bits_per_face".to_owned(), json!(rate(report.connectivity_bytes, report.num_faces)));
        let attributes = report.attributes.iter()
            .map(|a| json!({
                "name": a.name,
                "bytes": a.bytes,
                "bits_per_vertex": rate(a.bytes, num_vertices),
            }))
            .collect::<Vec<_>>();
        map.insert("attributes".to_owned(), Value::Array(attributes));
        map.insert("bits_per_vertex".to_owned(), json!(rate(report.total_bytes, num_vertices)));
    }
    value
}

fn rate(bytes: usize, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        (bytes * 8) as f64 / count as f64
    }
}
