//! Simple inspector for LionWeb chunk files (plain JSON or compressed).

use std::collections::BTreeMap;
use std::fs;

use lionweb_runtime::codec::{SerializedNode, SerializedReferenceTarget};
use lionweb_runtime::decode_chunk_bytes;
use lionweb_runtime::limits::MAGIC_COMPRESSED;

fn format_target(target: &SerializedReferenceTarget) -> String {
    match (&target.target_id, &target.resolve_info) {
        (Some(id), Some(info)) => format!("{} ({})", id, info),
        (Some(id), None) => id.to_string(),
        (None, Some(info)) => format!("? ({})", info),
        (None, None) => "?".to_string(),
    }
}

fn print_node(node: &SerializedNode) {
    println!("{} : {}", node.id, node.classifier.key);
    for property in node.properties.iter().take(5) {
        let value = property.value.as_deref().unwrap_or("null");
        let preview: String = value.chars().take(60).collect();
        println!("      {} = {:?}", property.property.key, preview);
    }
    for containment in &node.containments {
        println!("      {} contains {} node(s)", containment.containment.key, containment.children.len());
    }
    for reference in &node.references {
        let targets: Vec<String> = reference.targets.iter().map(format_target).collect();
        println!("      {} -> [{}]", reference.reference.key, targets.join(", "));
    }
    if !node.annotations.is_empty() {
        println!("      {} annotation(s)", node.annotations.len());
    }
}

fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| "chunk.json".to_string());

    println!("Reading: {}", path);

    let data = fs::read(&path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());
    if data.starts_with(MAGIC_COMPRESSED) {
        println!("Compressed: yes");
    }

    let chunk = decode_chunk_bytes(&data).expect("Failed to decode");

    println!("\n=== Chunk Info ===");
    println!("Format version: {}", chunk.serialization_format_version);
    println!("Languages: {}", chunk.languages.len());
    for language in &chunk.languages {
        println!("  - {} (version {})", language.key, language.version);
    }

    println!("\n=== Nodes ({}) ===", chunk.nodes.len());
    let mut per_classifier: BTreeMap<&str, usize> = BTreeMap::new();
    for node in &chunk.nodes {
        *per_classifier.entry(node.classifier.key.as_str()).or_default() += 1;
    }
    for (classifier, count) in &per_classifier {
        println!("  {}: {}", classifier, count);
    }
    let roots = chunk.nodes.iter().filter(|node| node.parent.is_none()).count();
    println!("  roots: {}", roots);

    println!("\n=== First 20 Nodes (detail) ===");
    for node in chunk.nodes.iter().take(20) {
        print_node(node);
    }
}
