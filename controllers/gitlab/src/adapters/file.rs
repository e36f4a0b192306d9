//! Repository file adapter
//!
//! The external name is the file path inside the repository. Since the path
//! is known up front, a file without an external name is observed by its
//! `filePath`, so a file that already exists on the branch is adopted
//! instead of failing the create.

use super::{Adapter, Creation, Observed, ParamsOf, create_failed, deleted, found, required_id, update_failed};
use crate::error::ControllerError;
use crate::late_init::{late_init_bool, matches};
use crate::references::ReferenceResolver;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use crds::{RepositoryFile, RepositoryFileObservation, RepositoryFileParameters};
use gitlab_client::{DeleteFileOptions, FileOptions, GitLabClientTrait};
use tracing::{info, warn};

/// Reconciles `RepositoryFile` objects
#[derive(Debug, Default, Clone, Copy)]
pub struct FileAdapter;

/// Raw bytes of a file returned by the API
fn decoded_content(file: &gitlab_client::RepositoryFile) -> Option<Vec<u8>> {
    if file.encoding == "base64" {
        match STANDARD.decode(file.content.trim()) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Could not decode content of {}: {}", file.file_path, e);
                None
            }
        }
    } else {
        Some(file.content.clone().into_bytes())
    }
}

fn file_options(params: &RepositoryFileParameters, with_start_branch: bool) -> FileOptions {
    FileOptions {
        branch: params.branch.clone(),
        content: params.content.clone(),
        commit_message: params.commit_message.clone(),
        encoding: None,
        author_email: params.author_email.clone(),
        author_name: params.author_name.clone(),
        start_branch: if with_start_branch {
            params.start_branch.clone()
        } else {
            None
        },
        execute_filemode: params.execute_filemode,
    }
}

#[async_trait::async_trait]
impl Adapter for FileAdapter {
    type Kind = RepositoryFile;
    type Remote = gitlab_client::RepositoryFile;

    fn default_external_name(&self, obj: &RepositoryFile) -> Option<String> {
        Some(obj.spec.for_provider.file_path.clone()).filter(|p| !p.is_empty())
    }

    async fn resolve_references(
        &self,
        resolver: &mut ReferenceResolver,
        params: &mut ParamsOf<RepositoryFile>,
    ) -> Result<(), ControllerError> {
        resolver
            .project_id(
                "projectId",
                &mut params.project_id,
                params.project_id_ref.as_ref(),
                params.project_id_selector.as_ref(),
            )
            .await
    }

    async fn observe(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &RepositoryFile,
    ) -> Result<Observed<Self::Remote>, ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        Ok(found(
            client.get_file(project_id, external_name, &params.branch).await,
            format!("file {} of project {} on {}", external_name, project_id, params.branch),
        )?
        .map_or(Observed::Absent, Observed::Exists))
    }

    fn observation(&self, remote: &Self::Remote) -> RepositoryFileObservation {
        RepositoryFileObservation {
            file_path: remote.file_path.clone(),
            file_name: Some(remote.file_name.clone()).filter(|n| !n.is_empty()),
            size: remote.size,
            content_sha256: remote.content_sha256.clone(),
            blob_id: remote.blob_id.clone(),
            last_commit_id: remote.last_commit_id.clone(),
        }
    }

    fn late_initialize(&self, params: &mut RepositoryFileParameters, remote: &Self::Remote) -> bool {
        late_init_bool(&mut params.execute_filemode, remote.execute_filemode.unwrap_or(false))
    }

    fn is_up_to_date(&self, params: &RepositoryFileParameters, remote: &Self::Remote) -> bool {
        decoded_content(remote).is_some_and(|content| content == params.content.as_bytes())
            && matches(&params.execute_filemode, &remote.execute_filemode.unwrap_or(false))
    }

    async fn create(
        &self,
        client: &dyn GitLabClientTrait,
        obj: &RepositoryFile,
    ) -> Result<Creation<RepositoryFileObservation>, ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        let info = client
            .create_file(project_id, &params.file_path, &file_options(params, true))
            .await
            .map_err(create_failed(format!(
                "file {} of project {}",
                params.file_path, project_id
            )))?;
        info!(
            "Created file {} on branch {} of GitLab project {}",
            info.file_path, info.branch, project_id
        );
        Ok(Creation::new(info.file_path))
    }

    async fn update(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &RepositoryFile,
        _remote: &Self::Remote,
    ) -> Result<(), ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        client
            .update_file(project_id, external_name, &file_options(params, false))
            .await
            .map_err(update_failed(format!("file {} of project {}", external_name, project_id)))?;
        info!("Committed {} to GitLab project {}", external_name, project_id);
        Ok(())
    }

    async fn delete(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &RepositoryFile,
    ) -> Result<(), ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        deleted(
            client
                .delete_file(
                    project_id,
                    external_name,
                    &DeleteFileOptions {
                        branch: params.branch.clone(),
                        commit_message: params.commit_message.clone(),
                        author_email: params.author_email.clone(),
                        author_name: params.author_name.clone(),
                    },
                )
                .await,
            format!("file {} of project {}", external_name, project_id),
        )
    }
}
