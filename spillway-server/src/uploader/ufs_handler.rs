// Copyright 2025 OPPO.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::storage::ShuffleFileInfo;
use crate::uploader::{ShuffleUploadResult, UploadHandler};
use bytes::BytesMut;
use log::{info, warn};
use opendal::layers::{LoggingLayer, RetryLayer, TimeoutLayer};
use opendal::{services, Operator};
use spillway_common::common::{ByteUnit, TimeSpent};
use spillway_common::conf::UploaderConf;
use spillway_common::error::SpillError;
use spillway_common::executor::AsyncRuntime;
use spillway_common::state::{RemoteStorageType, ShuffleKey};
use spillway_common::SpillResult;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

const TRANSFER_CHUNK_SIZE: usize = 8 * 1024 * 1024;

const UFS_IO_TIMEOUT: Duration = Duration::from_secs(60);
const UFS_RETRY_TIMES: usize = 3;

/// Remote sink over an opendal operator.
///
/// Remote layout under the configured base path:
///   <server_id>/<app_id>/<shuffle_id>/<p>-<p>/<server_id>.data|.index
/// or, for batches below the combine threshold, one merged pair:
///   <server_id>/<app_id>/<shuffle_id>/combine/<server_id>_<uuid>.data|.index
pub struct UfsUploadHandler {
    operator: Operator,
    rt: AsyncRuntime,
    server_id: String,
    combine_threshold: i64,
}

impl UfsUploadHandler {
    pub fn new(conf: &UploaderConf) -> SpillResult<Self> {
        let operator = Self::create_operator(conf)?;

        Ok(Self {
            operator,
            rt: AsyncRuntime::new("ufs-upload", 2),
            server_id: conf.server_id.clone(),
            combine_threshold: conf.combine_threshold_bytes(),
        })
    }

    // "<scheme>://<authority><root>" -> (authority, root)
    fn parse_base_path(base: &str) -> SpillResult<(String, String)> {
        let rest = match base.split_once("://") {
            Some((_, rest)) if !rest.is_empty() => rest,
            _ => {
                return Err(SpillError::invalid_conf(format!(
                    "remote_base_path {} has no scheme",
                    base
                )))
            }
        };

        let (authority, root) = match rest.split_once('/') {
            Some((authority, path)) => (authority.to_string(), format!("/{}", path)),
            None => (rest.to_string(), "/".to_string()),
        };

        Ok((authority, root))
    }

    fn create_operator(conf: &UploaderConf) -> SpillResult<Operator> {
        let storage_type = conf.remote_storage_type()?;
        let (authority, root) = Self::parse_base_path(&conf.remote_base_path)?;

        let operator = match storage_type {
            RemoteStorageType::LocalFs => {
                let builder = services::Fs::default().root(&root);
                Operator::new(builder)
                    .map_err(|e| SpillError::ufs(format!("create fs operator: {}", e)))?
                    .finish()
            }

            RemoteStorageType::S3 => {
                let mut builder = services::S3::default().bucket(&authority).root(&root);

                if let Some(endpoint) = conf.remote_conf.get("s3.endpoint_url") {
                    builder = builder.endpoint(endpoint);
                }
                let region = conf
                    .remote_conf
                    .get("s3.region_name")
                    .map(|s| s.as_str())
                    .unwrap_or("us-east-1");
                builder = builder.region(region);
                if let Some(access_key) = conf.remote_conf.get("s3.credentials.access") {
                    builder = builder.access_key_id(access_key);
                }
                if let Some(secret_key) = conf.remote_conf.get("s3.credentials.secret") {
                    builder = builder.secret_access_key(secret_key);
                }

                Operator::new(builder)
                    .map_err(|e| SpillError::ufs(format!("create s3 operator: {}", e)))?
                    .finish()
            }

            #[cfg(feature = "opendal-hdfs")]
            RemoteStorageType::Hdfs => {
                let mut builder = services::Hdfs::default()
                    .name_node(&format!("hdfs://{}", authority))
                    .root(&root);

                if let Some(user) = conf.remote_conf.get("hdfs.user") {
                    builder = builder.user(user);
                }

                Operator::new(builder)
                    .map_err(|e| SpillError::ufs(format!("create hdfs operator: {}", e)))?
                    .finish()
            }

            #[cfg(not(feature = "opendal-hdfs"))]
            RemoteStorageType::Hdfs => {
                return Err(SpillError::ufs(
                    "hdfs storage requires the opendal-hdfs feature",
                ));
            }
        };

        let operator = operator
            .layer(LoggingLayer::default())
            .layer(TimeoutLayer::new().with_io_timeout(UFS_IO_TIMEOUT))
            .layer(
                RetryLayer::new()
                    .with_max_times(UFS_RETRY_TIMES)
                    .with_factor(2.0)
                    .with_jitter(),
            );

        Ok(operator)
    }

    fn remote_prefix(&self, key: &ShuffleKey) -> String {
        format!("{}/{}/{}", self.server_id, key.app_id, key.shuffle_id)
    }

    // Stream one local file into one remote object, returns the bytes copied.
    async fn put_file(&self, local: &Path, remote: &str) -> SpillResult<u64> {
        let mut file = tokio::fs::File::open(local).await.map_err(SpillError::io)?;
        let mut writer = self
            .operator
            .writer(remote)
            .await
            .map_err(|e| SpillError::ufs(format!("open writer {}: {}", remote, e)))?;

        let mut copied = 0u64;
        let mut buf = BytesMut::with_capacity(TRANSFER_CHUNK_SIZE);
        loop {
            let n = file.read_buf(&mut buf).await.map_err(SpillError::io)?;
            if n == 0 {
                break;
            }
            copied += n as u64;
            writer
                .write(buf.split().freeze())
                .await
                .map_err(|e| SpillError::ufs(format!("write {}: {}", remote, e)))?;
        }

        writer
            .close()
            .await
            .map_err(|e| SpillError::ufs(format!("close {}: {}", remote, e)))?;

        Ok(copied)
    }

    // Append every local file into one remote object, returns the bytes copied.
    async fn concat_files(&self, files: &[std::path::PathBuf], remote: &str) -> SpillResult<u64> {
        let mut writer = self
            .operator
            .writer(remote)
            .await
            .map_err(|e| SpillError::ufs(format!("open writer {}: {}", remote, e)))?;

        let mut copied = 0u64;
        let mut buf = BytesMut::with_capacity(TRANSFER_CHUNK_SIZE);
        for local in files {
            let mut file = tokio::fs::File::open(local).await.map_err(SpillError::io)?;
            loop {
                let n = file.read_buf(&mut buf).await.map_err(SpillError::io)?;
                if n == 0 {
                    break;
                }
                copied += n as u64;
                writer
                    .write(buf.split().freeze())
                    .await
                    .map_err(|e| SpillError::ufs(format!("write {}: {}", remote, e)))?;
            }
        }

        writer
            .close()
            .await
            .map_err(|e| SpillError::ufs(format!("close {}: {}", remote, e)))?;

        Ok(copied)
    }

    // One object pair per partition; failed partitions are skipped and stay
    // local, the result reports only what became durable.
    async fn upload_partitions(&self, info: &ShuffleFileInfo) -> ShuffleUploadResult {
        let prefix = self.remote_prefix(info.key());

        let mut uploaded = vec![];
        let mut bytes = 0i64;
        for (i, partition) in info.partitions().iter().enumerate() {
            let dir = format!("{}/{}-{}", prefix, partition, partition);
            let data_obj = format!("{}/{}.data", dir, self.server_id);
            let index_obj = format!("{}/{}.index", dir, self.server_id);

            let res = async {
                let n = self.put_file(&info.data_files()[i], &data_obj).await?;
                self.put_file(&info.index_files()[i], &index_obj).await?;
                Ok::<u64, SpillError>(n)
            }
            .await;

            match res {
                Ok(n) => {
                    uploaded.push(*partition);
                    bytes += n as i64;
                }
                Err(e) => {
                    warn!(
                        "Upload partition {} of {} fail: {}",
                        partition,
                        info.key(),
                        e
                    );
                }
            }
        }

        ShuffleUploadResult::new(bytes, uploaded)
    }

    // Merge a small batch into a single data/index object pair. All or
    // nothing: an error reports zero uploaded partitions.
    async fn upload_combined(&self, info: &ShuffleFileInfo) -> SpillResult<ShuffleUploadResult> {
        let prefix = self.remote_prefix(info.key());
        let name = format!("{}_{}", self.server_id, Uuid::new_v4());

        let data_obj = format!("{}/combine/{}.data", prefix, name);
        let index_obj = format!("{}/combine/{}.index", prefix, name);

        let bytes = self.concat_files(info.data_files(), &data_obj).await?;
        self.concat_files(info.index_files(), &index_obj).await?;

        Ok(ShuffleUploadResult::new(
            bytes as i64,
            info.partitions().to_vec(),
        ))
    }
}

impl UploadHandler for UfsUploadHandler {
    fn upload(&self, info: &ShuffleFileInfo) -> SpillResult<ShuffleUploadResult> {
        let spent = TimeSpent::new();

        let result = self.rt.block_on(async {
            if info.should_combine(self.combine_threshold) {
                self.upload_combined(info).await
            } else {
                Ok(self.upload_partitions(info).await)
            }
        })?;

        info!(
            "Upload {}: {}/{} partitions, {}, cost {} ms",
            info.key(),
            result.partition_ids.len(),
            info.len(),
            ByteUnit::byte_to_string(result.uploaded_bytes.max(0) as u64),
            spent.used_ms()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use crate::uploader::UfsUploadHandler;
    use spillway_common::SpillResult;

    #[test]
    fn parse_base_path() -> SpillResult<()> {
        let (authority, root) = UfsUploadHandler::parse_base_path("hdfs://ns1/shuffle/data")?;
        assert_eq!(authority, "ns1");
        assert_eq!(root, "/shuffle/data");

        let (authority, root) = UfsUploadHandler::parse_base_path("s3://bucket")?;
        assert_eq!(authority, "bucket");
        assert_eq!(root, "/");

        let (authority, root) = UfsUploadHandler::parse_base_path("file:///tmp/remote")?;
        assert_eq!(authority, "");
        assert_eq!(root, "/tmp/remote");

        assert!(UfsUploadHandler::parse_base_path("hdfs://").is_err());

        Ok(())
    }
}
