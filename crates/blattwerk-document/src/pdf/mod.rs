// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF operations: structural edits via `lopdf`, generation via `printpdf`,
// rasterisation via `pdfium-render`.

pub mod compress;
pub mod reader;
pub mod render;
pub mod security;
pub mod watermark;
pub mod writer;
