//! Synthetic builds for context tests
//!
//! A [`FixtureBuilder`] lays out files as BLTE blocks in one archive and
//! produces the encoding table, the root table and the configuration
//! documents that reference them. The result can be installed as a local
//! installation or served from a mock CDN.

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::path::Path;

use casket_crypto::{Key, name_hash};
use casket_formats::archive::ArchiveIndexBuilder;
use casket_formats::blte::{BlteBuilder, CompressionMode};
use casket_formats::encoding::EncodingBuilder;
use casket_formats::local_index::{LocalIndexBuilder, bucket_for_key, index_file_name};
use casket_formats::root::{ContentFlags, LocaleFlags, RootBuilder, RootRecord, RootVersion};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const ITEM: &str = "DBFilesClient\\Item.dbc";
pub const SPELL: &str = "DBFilesClient\\Spell.dbc";

/// One file of a fixture build
#[derive(Debug, Clone)]
pub struct FixtureFile {
    pub name: String,
    pub file_data_id: u32,
    pub locale: LocaleFlags,
    pub blocks: Vec<Vec<u8>>,
}

impl FixtureFile {
    pub fn content(&self) -> Vec<u8> {
        self.blocks.concat()
    }

    pub fn content_key(&self) -> Key {
        Key::from_data(&self.content())
    }
}

#[derive(Debug, Default)]
pub struct FixtureBuilder {
    files: Vec<FixtureFile>,
    corrupt_block: Option<String>,
    omit_from_encoding: Option<String>,
    unindexed_block: Option<String>,
    loose: Vec<String>,
    corrupt_encoding: bool,
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(
        mut self,
        name: &str,
        file_data_id: u32,
        locale: impl Into<LocaleFlags>,
        blocks: Vec<Vec<u8>>,
    ) -> Self {
        self.files.push(FixtureFile {
            name: name.to_string(),
            file_data_id,
            locale: locale.into(),
            blocks,
        });
        self
    }

    /// Flip a byte in the last block of `name` after its key is computed
    pub fn corrupt_block(mut self, name: &str) -> Self {
        self.corrupt_block = Some(name.to_string());
        self
    }

    /// Keep `name` in the root table but leave it out of the encoding table
    pub fn omit_from_encoding(mut self, name: &str) -> Self {
        self.omit_from_encoding = Some(name.to_string());
        self
    }

    /// Keep the last block of `name` in the encoding table but store it nowhere
    pub fn unindexed_block(mut self, name: &str) -> Self {
        self.unindexed_block = Some(name.to_string());
        self
    }

    /// Store the blocks of `name` as loose CDN files instead of in the archive
    pub fn loose(mut self, name: &str) -> Self {
        self.loose.push(name.to_string());
        self
    }

    /// Damage the encoding table container
    pub fn corrupt_encoding(mut self) -> Self {
        self.corrupt_encoding = true;
        self
    }

    pub fn build(self) -> Fixture {
        let mut archive = Archive::default();
        let mut loose = Vec::new();
        let mut encoding = EncodingBuilder::new();
        let mut root = RootBuilder::new(RootVersion::V2);

        for file in &self.files {
            let is_loose = self.loose.contains(&file.name);
            let corrupt = self.corrupt_block.as_deref() == Some(file.name.as_str());
            let unindexed = self.unindexed_block.as_deref() == Some(file.name.as_str());

            let mut keys = Vec::new();
            for (i, block) in file.blocks.iter().enumerate() {
                let mut container = BlteBuilder::new()
                    .add_chunked(block, 256, CompressionMode::ZLib)
                    .build()
                    .unwrap();
                let key = Key::from_data(&container);
                if corrupt && i + 1 == file.blocks.len() {
                    let last = container.len() - 1;
                    container[last] ^= 0xFF;
                }
                if unindexed && i + 1 == file.blocks.len() {
                    keys.push(key);
                    continue;
                }
                if is_loose {
                    loose.push((key, container));
                } else {
                    archive.store(key, container);
                }
                keys.push(key);
            }

            let ckey = file.content_key();
            if self.omit_from_encoding.as_deref() != Some(file.name.as_str()) {
                encoding = encoding.add_entry(ckey, file.content().len() as u64, keys);
            }
            root = root.add_block(
                file.locale,
                ContentFlags::default(),
                vec![RootRecord::named(file.file_data_id, ckey, name_hash(&file.name))],
            );
        }

        let root = root.build().unwrap();
        let root_ckey = Key::from_data(&root);
        let root_container = BlteBuilder::new()
            .add_chunked(&root, 256, CompressionMode::ZLib)
            .build()
            .unwrap();
        let root_ekey = Key::from_data(&root_container);
        archive.store(root_ekey, root_container);

        let encoding = encoding
            .add_entry(root_ckey, root.len() as u64, vec![root_ekey])
            .build()
            .unwrap();
        let encoding_ckey = Key::from_data(&encoding);
        let mut encoding_container = BlteBuilder::new()
            .add_chunk(encoding.clone(), CompressionMode::ZLib)
            .build()
            .unwrap();
        let encoding_ekey = Key::from_data(&encoding_container);
        if self.corrupt_encoding {
            let last = encoding_container.len() - 1;
            encoding_container[last] ^= 0xFF;
        }
        archive.store(encoding_ekey, encoding_container);

        let archive_index = archive
            .blocks
            .iter()
            .fold(ArchiveIndexBuilder::new(), |builder, block| {
                builder.add(block.key, block.size, block.offset)
            })
            .build()
            .unwrap();
        let archive_key = Key::from_data(&archive_index);

        let build_config = format!(
            "# Build Configuration\n\n\
             root = {}\n\
             encoding = {} {}\n\
             encoding-size = {} {}\n\
             build-name = WOW-99999patch9.9.9_Fixture\n",
            root_ckey.to_hex(),
            encoding_ckey.to_hex(),
            encoding_ekey.to_hex(),
            encoding.len(),
            archive.blocks.last().map_or(0, |b| b.size),
        );
        let cdn_config = format!(
            "# CDN Configuration\n\narchives = {}\narchive-group = {}\n",
            archive_key.to_hex(),
            Key::from_data(b"group").to_hex(),
        );

        Fixture {
            build_key: Key::from_data(build_config.as_bytes()),
            cdn_key: Key::from_data(cdn_config.as_bytes()),
            files: self.files,
            archive,
            archive_index,
            archive_key,
            loose,
            build_config,
            cdn_config,
            encoding_ekey,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredBlock {
    pub key: Key,
    pub offset: u64,
    pub size: u32,
}

/// Containers laid out back to back, CDN style
#[derive(Debug, Default)]
pub struct Archive {
    pub data: Vec<u8>,
    pub blocks: Vec<StoredBlock>,
}

impl Archive {
    fn store(&mut self, key: Key, container: Vec<u8>) {
        self.blocks.push(StoredBlock {
            key,
            offset: self.data.len() as u64,
            size: container.len() as u32,
        });
        self.data.extend_from_slice(&container);
    }
}

#[derive(Debug)]
pub struct Fixture {
    pub files: Vec<FixtureFile>,
    pub archive: Archive,
    pub archive_index: Vec<u8>,
    pub archive_key: Key,
    pub loose: Vec<(Key, Vec<u8>)>,
    pub build_config: String,
    pub build_key: Key,
    pub cdn_config: String,
    pub cdn_key: Key,
    pub encoding_ekey: Key,
}

impl Fixture {
    pub fn file(&self, name: &str) -> &FixtureFile {
        self.files
            .iter()
            .find(|f| f.name == name)
            .expect("fixture file")
    }

    /// Write a local installation under `dir`
    ///
    /// Local data files prefix every block with a 30-byte header and the
    /// `.idx` documents address the header.
    pub fn install_local(&self, dir: &Path) {
        let build_info = format!(
            "Branch!STRING:0|Active!DEC:1|Build Key!HEX:16|CDN Key!HEX:16|Version!STRING:0|Product!STRING:0\n\
             ## seqn = 1\n\
             us|1|{}|{}|9.9.9.99999|wow\n",
            self.build_key.to_hex(),
            self.cdn_key.to_hex(),
        );
        std::fs::write(dir.join(".build.info"), build_info).unwrap();

        for (key, text) in [
            (self.build_key, &self.build_config),
            (self.cdn_key, &self.cdn_config),
        ] {
            let path = config_path(dir, &key);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, text).unwrap();
        }

        let data_dir = dir.join("Data").join("data");
        std::fs::create_dir_all(&data_dir).unwrap();

        let mut data = Vec::new();
        let mut buckets: BTreeMap<u8, LocalIndexBuilder> = BTreeMap::new();
        for block in &self.archive.blocks {
            let start = block.offset as usize;
            let container = &self.archive.data[start..start + block.size as usize];
            let offset = data.len() as u32;
            let size = container.len() as u32 + 30;

            let mut reversed = block.key.as_bytes().to_vec();
            reversed.reverse();
            data.extend_from_slice(&reversed);
            data.extend_from_slice(&size.to_le_bytes());
            data.extend_from_slice(&[0; 10]);
            data.extend_from_slice(container);

            let bucket = bucket_for_key(block.key.as_bytes());
            let builder = buckets
                .remove(&bucket)
                .unwrap_or_else(|| LocalIndexBuilder::new(bucket));
            buckets.insert(bucket, builder.add(&block.key, 0, offset, size));
        }
        std::fs::write(data_dir.join("data.000"), data).unwrap();

        for (bucket, builder) in buckets {
            std::fs::write(
                data_dir.join(index_file_name(bucket, 1)),
                builder.build().unwrap(),
            )
            .unwrap();
        }
    }

    /// Serve the build from `server` under `prefix`, returning the CDN root
    pub async fn mount_remote(&self, server: &MockServer, prefix: &str) -> Url {
        let hex = self.archive_key.to_hex();
        let documents = [
            (cdn_path(prefix, "config", &self.build_key, ""), self.build_config.clone().into_bytes()),
            (cdn_path(prefix, "config", &self.cdn_key, ""), self.cdn_config.clone().into_bytes()),
            (cdn_path(prefix, "data", &self.archive_key, ".index"), self.archive_index.clone()),
        ];
        for (route, body) in documents {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
                .mount(server)
                .await;
        }

        Mock::given(method("GET"))
            .and(path(format!("{prefix}/data/{}/{}/{hex}", &hex[..2], &hex[2..4])))
            .respond_with(RangeResponder(self.archive.data.clone()))
            .mount(server)
            .await;

        for (key, container) in &self.loose {
            Mock::given(method("GET"))
                .and(path(cdn_path(prefix, "data", key, "")))
                .respond_with(RangeResponder(container.clone()))
                .mount(server)
                .await;
        }

        format!("{}{prefix}", server.uri()).parse().unwrap()
    }
}

fn config_path(dir: &Path, key: &Key) -> std::path::PathBuf {
    let hex = key.to_hex();
    dir.join("Data")
        .join("config")
        .join(&hex[..2])
        .join(&hex[2..4])
        .join(&hex)
}

fn cdn_path(prefix: &str, kind: &str, key: &Key, suffix: &str) -> String {
    let hex = key.to_hex();
    format!("{prefix}/{kind}/{}/{}/{hex}{suffix}", &hex[..2], &hex[2..4])
}

/// Answers `Range: bytes=a-b` requests with 206 slices, anything else with the whole body
struct RangeResponder(Vec<u8>);

impl Respond for RangeResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let range = request
            .headers
            .get("range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("bytes="))
            .and_then(|v| v.split_once('-'))
            .and_then(|(start, end)| {
                let start: usize = start.parse().ok()?;
                let end = if end.is_empty() {
                    self.0.len() - 1
                } else {
                    end.parse::<usize>().ok()?.min(self.0.len() - 1)
                };
                Some((start, end))
            });

        match range {
            Some((start, end)) if start <= end => {
                ResponseTemplate::new(206).set_body_bytes(self.0[start..=end].to_vec())
            }
            Some(_) => ResponseTemplate::new(416),
            None => ResponseTemplate::new(200).set_body_bytes(self.0.clone()),
        }
    }
}

/// Deterministic block contents
pub fn block(seed: u8, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}
