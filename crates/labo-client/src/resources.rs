//! [`ResourceBackend`] over the publication, event and tool services.
//!
//! | Method | Path |
//! |--------|------|
//! | `GET`    | `<collection>` |
//! | `GET`    | `<collection>/{id}` |
//! | `POST`   | `<collection>` |
//! | `PUT`    | `<collection>/{id}` |
//! | `DELETE` | `<collection>/{id}` |
//!
//! `<collection>` is [`WireResource::PATH`] for each kind.

use labo_core::{
  backend::ResourceBackend,
  resource::{NewResource, Resource, ResourceId},
};

use crate::{ApiClient, Error, Result, WireResource};

impl<F: WireResource> ResourceBackend<F> for ApiClient {
  type Error = Error;

  async fn list(&self) -> Result<Vec<Resource<F>>> {
    let raw: Vec<F::In> = self.get_json(F::PATH, F::KIND.as_str()).await?;
    Ok(raw.into_iter().map(F::from_wire).collect())
  }

  async fn get(&self, id: ResourceId) -> Result<Option<Resource<F>>> {
    let raw: Option<F::In> = self
      .get_optional(&format!("{}/{id}", F::PATH), F::KIND.as_str())
      .await?;
    Ok(raw.map(F::from_wire))
  }

  async fn create(&self, input: NewResource<F>) -> Result<Resource<F>> {
    let raw: F::In = self
      .post_json(F::PATH, &F::to_wire(&input), F::KIND.as_str())
      .await?;
    Ok(F::from_wire(raw))
  }

  async fn update(&self, id: ResourceId, input: NewResource<F>) -> Result<()> {
    self
      .put(&format!("{}/{id}", F::PATH), &F::to_wire(&input))
      .await
  }

  async fn delete(&self, id: ResourceId) -> Result<()> {
    ApiClient::delete(self, &format!("{}/{id}", F::PATH)).await
  }
}
