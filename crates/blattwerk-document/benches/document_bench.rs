// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for document processing in the blattwerk-document
// crate. Currently benchmarks the merge path on small generated documents.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use blattwerk_document::{PdfReader, PdfWriter};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Benchmark merging two multi-page generated PDFs.
///
/// The inputs are built once outside the measurement loop; each iteration
/// parses both documents, renumbers their objects, rebuilds the page tree,
/// and re-serialises — the full cost a `/api/merge` request pays.
fn bench_merge(c: &mut Criterion) {
    let first = PdfWriter::a4()
        .create_from_text(&"alpha beta gamma delta\n".repeat(400))
        .expect("generate first input");
    let second = PdfWriter::a4()
        .create_from_text(&"epsilon zeta eta theta\n".repeat(400))
        .expect("generate second input");
    let inputs = vec![first, second];

    c.bench_function("merge (2 generated documents)", |b| {
        b.iter(|| {
            let merged = PdfReader::merge(black_box(&inputs)).expect("merge");
            black_box(merged);
        });
    });
}

criterion_group!(benches, bench_merge);
criterion_main!(benches);
