use coursemart::{NewShop, Record, Shop};

use crate::{confirmation, decode, ClientError, CoursemartClient, Credentials};

impl CoursemartClient {
    /// Every course, in the order the service stored them.
    pub async fn list_shops(&self) -> Result<Vec<Record<Shop>>, ClientError> {
        let response = self.http.get(self.url(&["api", "shops"])?).send().await?;
        decode(response, "Failed to fetch courses").await
    }

    /// One course by id.
    pub async fn get_shop(&self, id: &str) -> Result<Record<Shop>, ClientError> {
        let response = self
            .http
            .get(self.url(&["api", "shops", id])?)
            .send()
            .await?;
        decode(response, "Failed to fetch course").await
    }

    /// Create a course; the service assigns its id.
    pub async fn create_shop(
        &self,
        shop: &NewShop,
        credentials: &Credentials,
    ) -> Result<Record<Shop>, ClientError> {
        let request = self.http.post(self.url(&["api", "shops"])?).json(shop);
        let response = Self::authorized(request, credentials).send().await?;
        decode(response, "Failed to create course").await
    }

    /// Returns the server's confirmation message.
    pub async fn delete_shop(
        &self,
        id: &str,
        credentials: &Credentials,
    ) -> Result<String, ClientError> {
        let request = self.http.delete(self.url(&["api", "shops", id])?);
        let response = Self::authorized(request, credentials).send().await?;
        confirmation(response, "Failed to delete course").await
    }
}
