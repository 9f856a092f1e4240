//! Synthetic ESE files for tests.
//!
//! Builds database images byte by byte: file header, pages with tag
//! directories for either layout, catalog records and data records.

use crate::page::{PageFlags, TagFlags};
use crate::types::{FormatLayout, ESE_SIGNATURE, TAG_SIZE};
use std::collections::BTreeMap;

/// Tagged data flag marking a long-value reference
pub const TAGGED_LONG_VALUE: u8 = 0x04;

/// Tagged data flag marking compressed data
pub const TAGGED_COMPRESSED: u8 = 0x02;

/// Tagged data flag marking multi-valued data
pub const TAGGED_MULTI_VALUE: u8 = 0x08;

/// A page under construction
#[derive(Debug, Clone)]
pub struct PageBuilder {
    flags: PageFlags,
    next: u32,
    values: Vec<(TagFlags, Vec<u8>)>,
}

impl PageBuilder {
    fn with_flags(flags: PageFlags) -> Self {
        Self {
            flags,
            next: 0,
            // Tag 0: empty external key
            values: vec![(TagFlags::empty(), Vec::new())],
        }
    }

    /// A leaf page
    pub fn leaf() -> Self {
        Self::with_flags(PageFlags::LEAF)
    }

    /// A branch page
    pub fn branch() -> Self {
        Self::with_flags(PageFlags::PARENT)
    }

    /// Add page flags
    pub fn flags(mut self, flags: PageFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Set the next page of the leaf chain
    pub fn next_page(mut self, next: u32) -> Self {
        self.next = next;
        self
    }

    /// Replace the external key held in tag 0
    pub fn external_key(mut self, key: &[u8]) -> Self {
        self.values[0] = (TagFlags::empty(), key.to_vec());
        self
    }

    /// Drop every tag, external header included
    pub fn no_tags(mut self) -> Self {
        self.values.clear();
        self
    }

    /// Append a raw tagged value
    pub fn raw_value(mut self, flags: TagFlags, data: &[u8]) -> Self {
        self.values.push((flags, data.to_vec()));
        self
    }

    /// Append a leaf entry with an uncompressed key
    pub fn leaf_entry(self, key: &[u8], data: &[u8]) -> Self {
        let mut bytes = Vec::new();
        bytes.extend((key.len() as u16).to_le_bytes());
        bytes.extend(key);
        bytes.extend(data);
        self.raw_value(TagFlags::empty(), &bytes)
    }

    /// Append a leaf entry sharing `common` bytes with the external key
    pub fn common_leaf_entry(self, common: u16, key: &[u8], data: &[u8]) -> Self {
        let mut bytes = Vec::new();
        bytes.extend(common.to_le_bytes());
        bytes.extend((key.len() as u16).to_le_bytes());
        bytes.extend(key);
        bytes.extend(data);
        self.raw_value(TagFlags::COMMON, &bytes)
    }

    /// Append a branch entry pointing at `child`
    pub fn child(self, key: &[u8], child: u32) -> Self {
        let mut bytes = Vec::new();
        bytes.extend((key.len() as u16).to_le_bytes());
        bytes.extend(key);
        bytes.extend(child.to_le_bytes());
        self.raw_value(TagFlags::empty(), &bytes)
    }

    /// Encode the page for the given layout
    pub fn encode(&self, layout: &FormatLayout) -> Vec<u8> {
        let mut page = vec![0u8; layout.page_size];
        page[20..24].copy_from_slice(&self.next.to_le_bytes());
        page[34..36].copy_from_slice(&(self.values.len() as u16).to_le_bytes());
        page[36..40].copy_from_slice(&self.flags.bits().to_le_bytes());

        let base = layout.page_header_size();
        let mut offset = 0usize;
        for (i, (flags, data)) in self.values.iter().enumerate() {
            let mut data = data.clone();
            let offset_field = if layout.has_large_tags() {
                if !flags.is_empty() {
                    data[1] |= flags.bits() << 5;
                }
                offset as u16
            } else {
                offset as u16 | ((flags.bits() as u16) << 13)
            };

            let directory = layout.page_size - TAG_SIZE * (i + 1);
            assert!(base + offset + data.len() <= directory, "page overflow");
            page[base + offset..base + offset + data.len()].copy_from_slice(&data);
            page[directory..directory + 2].copy_from_slice(&(data.len() as u16).to_le_bytes());
            page[directory + 2..directory + 4].copy_from_slice(&offset_field.to_le_bytes());
            offset += data.len();
        }
        page
    }
}

/// A whole database image
pub struct EseFileBuilder {
    layout: FormatLayout,
    pages: BTreeMap<u32, Vec<u8>>,
}

impl EseFileBuilder {
    /// Start an image with the given layout
    pub fn new(layout: FormatLayout) -> Self {
        Self {
            layout,
            pages: BTreeMap::new(),
        }
    }

    /// Place a page at logical page number `id`
    pub fn page(mut self, id: u32, page: PageBuilder) -> Self {
        self.pages.insert(id, page.encode(&self.layout));
        self
    }

    /// Place raw page bytes at logical page number `id`
    pub fn raw_page(mut self, id: u32, bytes: Vec<u8>) -> Self {
        self.pages.insert(id, bytes);
        self
    }

    /// Produce the file bytes
    pub fn build(&self) -> Vec<u8> {
        let page_size = self.layout.page_size;
        let last = self.pages.keys().next_back().copied().unwrap_or(0);
        let mut file = vec![0u8; (last as usize + 2) * page_size];

        let mut header = vec![0u8; page_size];
        header[4..8].copy_from_slice(&ESE_SIGNATURE.to_le_bytes());
        header[8..12].copy_from_slice(&self.layout.version.to_le_bytes());
        header[52..56].copy_from_slice(&3u32.to_le_bytes());
        header[232..236].copy_from_slice(&self.layout.revision.to_le_bytes());
        header[236..240].copy_from_slice(&(page_size as u32).to_le_bytes());
        file[..page_size].copy_from_slice(&header);
        file[page_size..2 * page_size].copy_from_slice(&header);

        for (id, bytes) in &self.pages {
            let start = (*id as usize + 1) * page_size;
            file[start..start + page_size].copy_from_slice(bytes);
        }
        file
    }
}

/// A data record under construction
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    fixed: Vec<(Vec<u8>, bool)>,
    variable: Vec<Option<Vec<u8>>>,
    tagged: Vec<(u16, u8, Vec<u8>)>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next fixed column (ids are assigned 1, 2, ...)
    pub fn fixed(mut self, bytes: &[u8]) -> Self {
        self.fixed.push((bytes.to_vec(), false));
        self
    }

    /// Next fixed column, null, still occupying `width` bytes
    pub fn null_fixed(mut self, width: usize) -> Self {
        self.fixed.push((vec![0u8; width], true));
        self
    }

    /// Next variable column (ids are assigned 128, 129, ...)
    pub fn variable(mut self, bytes: Option<&[u8]>) -> Self {
        self.variable.push(bytes.map(|b| b.to_vec()));
        self
    }

    /// A tagged column with its flag byte
    pub fn tagged(mut self, id: u16, flags: u8, bytes: &[u8]) -> Self {
        self.tagged.push((id, flags, bytes.to_vec()));
        self
    }

    /// Encode the record for the given layout
    pub fn encode(&self, layout: &FormatLayout) -> Vec<u8> {
        let last_fixed = self.fixed.len();
        let null_bytes = (last_fixed + 7) / 8;
        let fixed_size: usize = self.fixed.iter().map(|(b, _)| b.len()).sum();
        let variable_offset = 4 + fixed_size + null_bytes;
        let last_variable = 127 + self.variable.len();

        let mut out = vec![last_fixed as u8, last_variable as u8];
        out.extend((variable_offset as u16).to_le_bytes());
        for (bytes, _) in &self.fixed {
            out.extend(bytes);
        }
        let mut nulls = vec![0u8; null_bytes];
        for (i, (_, null)) in self.fixed.iter().enumerate() {
            if *null {
                nulls[i / 8] |= 1 << (i % 8);
            }
        }
        out.extend(nulls);

        let mut end = 0usize;
        let mut data: Vec<u8> = Vec::new();
        for value in &self.variable {
            match value {
                Some(bytes) => {
                    data.extend(bytes);
                    end += bytes.len();
                    out.extend((end as u16).to_le_bytes());
                }
                None => out.extend((end as u16 | 0x8000).to_le_bytes()),
            }
        }
        out.extend(data);

        if !self.tagged.is_empty() {
            let directory_len = TAG_SIZE * self.tagged.len();
            let mut directory = Vec::new();
            let mut items = Vec::new();
            for (id, flags, bytes) in &self.tagged {
                let offset = (directory_len + items.len()) as u16;
                let field = if layout.has_large_tags() {
                    items.push(*flags);
                    offset
                } else if *flags != 0 {
                    items.push(*flags);
                    offset | 0x4000
                } else {
                    offset
                };
                items.extend(bytes);
                directory.extend(id.to_le_bytes());
                directory.extend(field.to_le_bytes());
            }
            out.extend(directory);
            out.extend(items);
        }
        out
    }
}

/// Encode one catalog (MSysObjects) record
#[allow(clippy::too_many_arguments)]
pub fn catalog_record(
    object_id: u32,
    kind: u16,
    identifier: u32,
    coltyp_or_fdp: u32,
    space_usage: u32,
    flags: u32,
    pages_or_locale: u32,
    name: &str,
) -> Vec<u8> {
    RecordBuilder::new()
        .fixed(&object_id.to_le_bytes())
        .fixed(&kind.to_le_bytes())
        .fixed(&identifier.to_le_bytes())
        .fixed(&coltyp_or_fdp.to_le_bytes())
        .fixed(&space_usage.to_le_bytes())
        .fixed(&flags.to_le_bytes())
        .fixed(&pages_or_locale.to_le_bytes())
        .variable(Some(name.as_bytes()))
        .encode(&FormatLayout::new(0x620, 0x11, 8192))
}

pub fn table_record(name: &str, object_id: u32, fdp: u32) -> Vec<u8> {
    catalog_record(object_id, 1, object_id, fdp, 80, 0, 1, name)
}

pub fn column_record(table: u32, name: &str, id: u32, coltype: u32, width: u32, codepage: u32) -> Vec<u8> {
    catalog_record(table, 2, id, coltype, width, 0, codepage, name)
}

pub fn index_record(table: u32, name: &str, fdp: u32) -> Vec<u8> {
    catalog_record(table, 3, 0, fdp, 80, 0, 1033, name)
}

pub fn long_value_record(table: u32, name: &str, fdp: u32) -> Vec<u8> {
    catalog_record(table, 4, 0, fdp, 80, 0, 1, name)
}

/// Pack ASCII text seven bits per character, low bits first
pub fn pack_7bit(text: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let mut acc = 0u32;
    let mut bits = 0;
    for ch in text.bytes() {
        acc |= ((ch & 0x7F) as u32) << bits;
        bits += 7;
        while bits >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        out.push(acc as u8);
    }
    out
}

/// UTF-16LE bytes of a string
pub fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

/// Records of table `T`: `(Count, Name)`
pub fn t_row(count: i32, name: &str) -> Vec<u8> {
    RecordBuilder::new()
        .fixed(&count.to_le_bytes())
        .variable(Some(name.as_bytes()))
        .encode(&FormatLayout::new(0x620, 0x11, 8192))
}

/// Timestamp stored in the first `Notes` row
pub const NOTES_CREATED: i64 = 0x01D9_0000_1234_5678;

/// Text stored in the `Notes` long-value tree
pub const NOTES_LONG_TEXT: &str = "hello long value";

/// Text stored 7-bit packed inline in `Notes`
pub const NOTES_SHORT_TEXT: &str = "short note";

/// A small database with three tables:
///
/// - `T` (`Count` Long, `Name` Text): rows `(1, "a")`, `(2, "b")` spread
///   over a branch page and two chained leaves.
/// - `Notes` (`Id` Long, `Created` DateTime, `Body` LongText, `Blob`
///   LongBinary) with a long-value tree.
/// - `Broken` (`Id` Long): one good row and one truncated row.
pub fn scenario(layout: FormatLayout) -> Vec<u8> {
    let lv_ref = |lid: u32| lid.to_le_bytes();

    let mut compressed = vec![0x10];
    compressed.extend(pack_7bit(NOTES_SHORT_TEXT));

    let catalog = PageBuilder::leaf()
        .flags(PageFlags::ROOT)
        .leaf_entry(&[0x01], &table_record("T", 10, 5))
        .leaf_entry(&[0x02], &column_record(10, "Count", 1, 4, 4, 1252))
        .leaf_entry(&[0x03], &column_record(10, "Name", 128, 10, 255, 1252))
        .leaf_entry(&[0x04], &index_record(10, "TByName", 8))
        .leaf_entry(&[0x05], &table_record("Notes", 11, 9))
        .leaf_entry(&[0x06], &column_record(11, "Id", 1, 4, 4, 1252))
        .leaf_entry(&[0x07], &column_record(11, "Created", 2, 8, 8, 1252))
        .leaf_entry(&[0x08], &column_record(11, "Body", 256, 12, 0, 1200))
        .leaf_entry(&[0x09], &column_record(11, "Blob", 257, 11, 0, 0))
        .leaf_entry(&[0x0A], &long_value_record(11, "LVNotes", 12))
        .leaf_entry(&[0x0B], &table_record("Broken", 12, 13))
        .leaf_entry(&[0x0C], &column_record(12, "Id", 1, 4, 4, 1252));

    let notes = PageBuilder::leaf()
        .flags(PageFlags::ROOT)
        .leaf_entry(
            &[0x01],
            &RecordBuilder::new()
                .fixed(&1i32.to_le_bytes())
                .fixed(&NOTES_CREATED.to_le_bytes())
                .tagged(256, TAGGED_LONG_VALUE, &lv_ref(1))
                .encode(&layout),
        )
        .leaf_entry(
            &[0x02],
            &RecordBuilder::new()
                .fixed(&2i32.to_le_bytes())
                .null_fixed(8)
                .tagged(256, TAGGED_COMPRESSED, &compressed)
                .encode(&layout),
        )
        .leaf_entry(
            &[0x03],
            &RecordBuilder::new()
                .fixed(&3i32.to_le_bytes())
                .tagged(256, TAGGED_COMPRESSED, &[0x18, 0x41, 0x42])
                .tagged(257, TAGGED_LONG_VALUE, &lv_ref(0x63))
                .encode(&layout),
        );

    let long_values = PageBuilder::leaf()
        .flags(PageFlags::ROOT | PageFlags::LONG_VALUE)
        .external_key(&[0x00, 0x00, 0x00, 0x01])
        .leaf_entry(&[0x00, 0x00, 0x00, 0x01], &[0x01, 0x00, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00])
        .common_leaf_entry(4, &[0x00, 0x00, 0x00, 0x00], &utf16le(NOTES_LONG_TEXT));

    let broken = PageBuilder::leaf()
        .flags(PageFlags::ROOT)
        .leaf_entry(
            &[0x01],
            &RecordBuilder::new().fixed(&7i32.to_le_bytes()).encode(&layout),
        )
        .leaf_entry(&[0x02], &[0x01, 0x80]);

    EseFileBuilder::new(layout)
        .page(4, catalog)
        .page(5, PageBuilder::branch().flags(PageFlags::ROOT).child(&[0x01], 6))
        .page(6, PageBuilder::leaf().next_page(7).leaf_entry(&[0x01], &t_row(1, "a")))
        .page(7, PageBuilder::leaf().leaf_entry(&[0x02], &t_row(2, "b")))
        .page(
            8,
            PageBuilder::leaf()
                .flags(PageFlags::ROOT | PageFlags::INDEX)
                .leaf_entry(&[0x61], &[0x01, 0x00, 0x00, 0x00]),
        )
        .page(9, notes)
        .page(12, long_values)
        .page(13, broken)
        .build()
}
