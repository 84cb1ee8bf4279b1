// Copyright 2025 the Pretty Text Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod test_render;
mod test_style;
pub(crate) mod utils;
