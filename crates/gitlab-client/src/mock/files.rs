//! Repository files for MockGitLabClient
//!
//! Content is stored as plain text and returned base64-encoded, as GitLab does.

use super::MockGitLabClient;
use crate::error::GitLabError;
use crate::models::*;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub async fn get_file(client: &MockGitLabClient, project_id: i64, file_path: &str, git_ref: &str) -> Result<RepositoryFile, GitLabError> {
    client.record("get_file", format!("{}/{}@{}", project_id, file_path, git_ref))?;
    client
        .files
        .lock()
        .unwrap()
        .get(&(project_id, git_ref.to_string(), file_path.to_string()))
        .cloned()
        .map(|mut file| {
            file.content = STANDARD.encode(file.content.as_bytes());
            file.encoding = "base64".to_string();
            file.ref_ = git_ref.to_string();
            file
        })
        .ok_or_else(|| MockGitLabClient::not_found("File", file_path))
}

fn decode_content(options: &FileOptions) -> Result<String, GitLabError> {
    if options.encoding.as_deref() == Some("base64") {
        let bytes = STANDARD
            .decode(&options.content)
            .map_err(|e| GitLabError::InvalidRequest(format!("content is not base64: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| GitLabError::InvalidRequest(format!("content is not UTF-8: {}", e)))
    } else {
        Ok(options.content.clone())
    }
}

pub async fn create_file(client: &MockGitLabClient, project_id: i64, file_path: &str, options: &FileOptions) -> Result<FileInfo, GitLabError> {
    client.record("create_file", format!("{}/{}@{}", project_id, file_path, options.branch))?;
    let content = decode_content(options)?;
    let id = (project_id, options.branch.clone(), file_path.to_string());
    let mut files = client.files.lock().unwrap();
    if files.contains_key(&id) {
        return Err(GitLabError::Api {
            status: 400,
            message: "A file with this name already exists".to_string(),
        });
    }
    let commit = client.next_id();
    files.insert(
        id,
        RepositoryFile {
            file_name: file_path.rsplit('/').next().unwrap_or(file_path).to_string(),
            file_path: file_path.to_string(),
            size: content.len() as i64,
            encoding: "text".to_string(),
            content,
            last_commit_id: Some(format!("commit-{}", commit)),
            execute_filemode: options.execute_filemode,
            ..Default::default()
        },
    );
    Ok(FileInfo {
        file_path: file_path.to_string(),
        branch: options.branch.clone(),
    })
}

pub async fn update_file(client: &MockGitLabClient, project_id: i64, file_path: &str, options: &FileOptions) -> Result<FileInfo, GitLabError> {
    client.record("update_file", format!("{}/{}@{}", project_id, file_path, options.branch))?;
    let content = decode_content(options)?;
    let commit = client.next_id();
    let mut files = client.files.lock().unwrap();
    let file = files
        .get_mut(&(project_id, options.branch.clone(), file_path.to_string()))
        .ok_or_else(|| MockGitLabClient::not_found("File", file_path))?;
    file.size = content.len() as i64;
    file.content = content;
    file.last_commit_id = Some(format!("commit-{}", commit));
    if options.execute_filemode.is_some() {
        file.execute_filemode = options.execute_filemode;
    }
    Ok(FileInfo {
        file_path: file_path.to_string(),
        branch: options.branch.clone(),
    })
}

pub async fn delete_file(client: &MockGitLabClient, project_id: i64, file_path: &str, options: &DeleteFileOptions) -> Result<(), GitLabError> {
    client.record("delete_file", format!("{}/{}@{}", project_id, file_path, options.branch))?;
    client
        .files
        .lock()
        .unwrap()
        .remove(&(project_id, options.branch.clone(), file_path.to_string()))
        .map(|_| ())
        .ok_or_else(|| MockGitLabClient::not_found("File", file_path))
}
