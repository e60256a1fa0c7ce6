//! Account administration: users joined with their advisor records.

use std::collections::HashMap;

use visitdesk_client::ApiClient;
use visitdesk_types::{AuthorizedDays, NewUser, ProfileId, Role, UserId, UserPatch, UserRecord};

use crate::StoreError;

/// A user row, with the advisor fields filled in for advisors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub user: UserRecord,
    /// Weekday indices the advisor may approve tours on.
    pub authorized_day: Vec<u8>,
    pub advisor_id: Option<ProfileId>,
}

impl Account {
    fn is_advisor(&self) -> bool {
        self.user.role == Role::Advisor
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Only used for advisors.
    pub authorized_day: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Only used for advisors. `None` leaves the days untouched.
    pub authorized_day: Option<Vec<u8>>,
}

#[derive(Debug)]
pub struct AccountStore {
    client: ApiClient,
    accounts: Vec<Account>,
}

impl AccountStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            accounts: Vec::new(),
        }
    }

    #[must_use]
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    #[must_use]
    pub fn get(&self, id: UserId) -> Option<&Account> {
        self.accounts.iter().find(|a| a.user.id == id)
    }

    pub async fn fetch_all(&mut self) -> Result<(), StoreError> {
        let users = self.client.users().list().await?;
        let advisors = self.client.advisors().list().await?;

        let by_user: HashMap<UserId, (ProfileId, Vec<u8>)> = advisors
            .into_iter()
            .filter_map(|a| a.user.map(|user| (user, (a.id, a.authorized_day))))
            .collect();

        self.accounts = users
            .into_iter()
            .map(|user| {
                let advisor = (user.role == Role::Advisor)
                    .then(|| by_user.get(&user.id))
                    .flatten();
                Account {
                    authorized_day: advisor.map(|(_, days)| days.clone()).unwrap_or_default(),
                    advisor_id: advisor.map(|(id, _)| *id),
                    user,
                }
            })
            .collect();
        Ok(())
    }

    /// Create the user; advisors then get their authorized days set.
    pub async fn create(&mut self, account: &NewAccount) -> Result<UserRecord, StoreError> {
        let body = NewUser {
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
        };
        let user = self.client.users().create(&body).await?;
        tracing::info!(user = %user.id, role = %user.role, "Account created");

        if account.role == Role::Advisor
            && let Some(advisor) = user.advisor_id
        {
            self.client
                .advisors()
                .set_authorized_days(
                    advisor,
                    &AuthorizedDays {
                        authorized_day: account.authorized_day.clone(),
                    },
                )
                .await?;
        }
        Ok(user)
    }

    /// Delete a user, removing the advisor profile first when there is one.
    pub async fn delete(&mut self, id: UserId) -> Result<(), StoreError> {
        if let Some(advisor) = self
            .get(id)
            .filter(|a| a.is_advisor())
            .and_then(|a| a.advisor_id)
        {
            self.client.advisors().delete(advisor).await?;
        }
        self.client.users().delete(id).await?;
        self.accounts.retain(|a| a.user.id != id);
        tracing::info!(user = %id, "Account deleted");
        Ok(())
    }

    /// Only accounts loaded by [`fetch_all`](Self::fetch_all) can be
    /// updated; anything else fails before a request is sent.
    pub async fn partial_update(
        &mut self,
        id: UserId,
        update: &AccountUpdate,
    ) -> Result<(), StoreError> {
        let index = self
            .accounts
            .iter()
            .position(|a| a.user.id == id)
            .ok_or(StoreError::UnknownAccount(id))?;

        let patch = UserPatch {
            name: update.name.clone(),
            email: update.email.clone(),
        };
        let user = self.client.users().partial_update(id, &patch).await?;
        let account = &mut self.accounts[index];
        account.user = user;

        if account.is_advisor()
            && let (Some(advisor), Some(days)) = (account.advisor_id, &update.authorized_day)
        {
            self.client
                .advisors()
                .set_authorized_days(
                    advisor,
                    &AuthorizedDays {
                        authorized_day: days.clone(),
                    },
                )
                .await?;
            account.authorized_day.clone_from(days);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::with_base_url(
            server.uri().parse().unwrap(),
            std::time::Duration::from_secs(5),
        )
        .unwrap()
    }

    async fn mount_users_and_advisors(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/users/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 5, "email": "adv@uni.edu", "name": "Adv", "role": "advisor"},
                {"id": 6, "email": "g@uni.edu", "name": "Guide", "role": "guide"}
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/advisor/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 21, "user": 5, "authorizedDay": [0, 3], "isCoordinator": false}
            ])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn fetch_all_merges_advisor_records_into_users() {
        let server = MockServer::start().await;
        mount_users_and_advisors(&server).await;

        let mut store = AccountStore::new(client(&server));
        store.fetch_all().await.unwrap();

        let advisor = store.get(UserId::new(5)).unwrap();
        assert_eq!(advisor.authorized_day, [0, 3]);
        assert_eq!(advisor.advisor_id, Some(ProfileId::new(21)));
        let guide = store.get(UserId::new(6)).unwrap();
        assert!(guide.authorized_day.is_empty());
        assert_eq!(guide.advisor_id, None);
    }

    #[tokio::test]
    async fn creating_an_advisor_sets_authorized_days() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/create-user/"))
            .and(body_json(serde_json::json!({
                "name": "New Adv", "email": "new@uni.edu", "role": "advisor"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": 9, "email": "new@uni.edu", "name": "New Adv", "role": "advisor", "advisor_id": 30
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/advisor/30/"))
            .and(body_json(serde_json::json!({"authorizedDay": [1, 2]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"id": 30, "user": 9, "authorizedDay": [1, 2]}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let mut store = AccountStore::new(client(&server));
        store
            .create(&NewAccount {
                name: "New Adv".into(),
                email: "new@uni.edu".into(),
                role: Role::Advisor,
                authorized_day: vec![1, 2],
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn deleting_an_advisor_removes_the_advisor_profile_first() {
        let server = MockServer::start().await;
        mount_users_and_advisors(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/api/advisor/21/"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/users/5/"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut store = AccountStore::new(client(&server));
        store.fetch_all().await.unwrap();
        store.delete(UserId::new(5)).await.unwrap();
        assert!(store.get(UserId::new(5)).is_none());
    }

    #[tokio::test]
    async fn updating_an_unloaded_account_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/users/77/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 77, "email": "x@uni.edu", "name": "X", "role": "guide"
            })))
            .expect(0)
            .mount(&server)
            .await;

        let mut store = AccountStore::new(client(&server));
        let update = AccountUpdate {
            name: Some("X".into()),
            ..AccountUpdate::default()
        };
        let err = store
            .partial_update(UserId::new(77), &update)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownAccount(id) if id == UserId::new(77)));
    }

    #[tokio::test]
    async fn updating_an_advisor_patches_user_and_days() {
        let server = MockServer::start().await;
        mount_users_and_advisors(&server).await;
        Mock::given(method("PATCH"))
            .and(path("/api/users/5/"))
            .and(body_json(serde_json::json!({"name": "Renamed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 5, "email": "adv@uni.edu", "name": "Renamed", "role": "advisor"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/advisor/21/"))
            .and(body_json(serde_json::json!({"authorizedDay": [4]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"id": 21, "user": 5, "authorizedDay": [4]}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let mut store = AccountStore::new(client(&server));
        store.fetch_all().await.unwrap();
        let update = AccountUpdate {
            name: Some("Renamed".into()),
            email: None,
            authorized_day: Some(vec![4]),
        };
        store.partial_update(UserId::new(5), &update).await.unwrap();

        let advisor = store.get(UserId::new(5)).unwrap();
        assert_eq!(advisor.user.name, "Renamed");
        assert_eq!(advisor.authorized_day, [4]);
    }
}
