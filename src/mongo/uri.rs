use std::{fmt, str::FromStr};

use mongodb::options::{ConnectionString, HostInfo};

use crate::util::error::{MrError, MrResult};

/// `scheme://[user[:password]@]host[,host...]/database.collection[?options]`
///
/// Only the `.collection` suffix is split off here. Everything else goes
/// through the driver's connection string parser, so credentials come back
/// percent-decoded and hosts are validated the way the client will see them.
#[derive(Clone, PartialEq)]
pub struct MongoConnectionUri {
    scheme: String,
    driver_uri: String,
    connection: ConnectionString,
    database: String,
    collection: String,
    options: Option<String>,
}

fn uri_err(uri: &str, detail: &str) -> MrError {
    MrError::ConfigError("Invalid connection URI", format!("{}: {}", detail, redact(uri)))
}

fn redact(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_owned();
    };
    let authority_end = rest.find(|c: char| c == '/' || c == '?').unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    match authority.rfind('@') {
        Some(at) => {
            let user = authority[..at].split(':').next().unwrap_or("");
            format!("{}://{}:****@{}{}", scheme, user, &authority[at + 1..], tail)
        }
        None => uri.to_owned(),
    }
}

impl MongoConnectionUri {
    pub fn parse(uri: &str) -> MrResult<MongoConnectionUri> {
        let uri = uri.trim();
        let Some((scheme, rest)) = uri.split_once("://") else {
            return Err(uri_err(uri, "Expected scheme `mongodb://` or `mongodb+srv://`"));
        };
        let Some((authority, path_and_query)) = rest.split_once('/') else {
            return Err(uri_err(uri, "Missing `/database.collection` namespace"));
        };
        let (path, options) = match path_and_query.split_once('?') {
            Some((p, o)) => (p, Some(o.to_owned()).filter(|x| !x.is_empty())),
            None => (path_and_query, None),
        };
        let Some((database, collection)) = path.split_once('.') else {
            return Err(uri_err(uri, "Missing collection in namespace, expected `database.collection`"));
        };
        if database.is_empty() {
            return Err(uri_err(uri, "Missing database in namespace"));
        }
        if collection.is_empty() {
            return Err(uri_err(uri, "Missing collection in namespace, expected `database.collection`"));
        }

        let driver_uri = match &options {
            Some(o) => format!("{}://{}/{}?{}", scheme, authority, database, o),
            None => format!("{}://{}/{}", scheme, authority, database),
        };
        let connection = ConnectionString::parse(&driver_uri).map_err(|e| uri_err(uri, &e.kind.to_string()))?;
        if let Some(credential) = &connection.credential {
            if credential.username.as_deref().is_none_or(str::is_empty) && credential.password.is_some() {
                return Err(uri_err(uri, "Username must not be empty"));
            }
        }
        let database = match &connection.default_database {
            Some(db) if !db.is_empty() => db.to_owned(),
            _ => return Err(uri_err(uri, "Missing database in namespace")),
        };

        Ok(MongoConnectionUri {
            scheme: scheme.to_owned(),
            driver_uri,
            connection,
            database,
            collection: collection.to_owned(),
            options,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn username(&self) -> Option<&str> {
        self.connection.credential.as_ref().and_then(|c| c.username.as_deref())
    }

    pub fn password(&self) -> Option<&str> {
        self.connection.credential.as_ref().and_then(|c| c.password.as_deref())
    }

    /// Seed list as `host:port`, or the SRV record name for `mongodb+srv`.
    pub fn hosts(&self) -> Vec<String> {
        match &self.connection.host_info {
            HostInfo::HostIdentifiers(addresses) => addresses.iter().map(|a| a.to_string()).collect(),
            HostInfo::DnsRecord(record) => vec![record.to_owned()],
            _ => vec![],
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn options(&self) -> Option<&str> {
        self.options.as_deref()
    }

    pub fn connection_string(&self) -> &ConnectionString {
        &self.connection
    }

    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }

    /// The URI handed to the driver: the path only names the database.
    pub fn driver_uri(&self) -> &str {
        &self.driver_uri
    }
}

impl FromStr for MongoConnectionUri {
    type Err = MrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MongoConnectionUri::parse(s)
    }
}

/// Anything a connector can be bound to: raw URI strings or an already parsed URI.
pub trait IntoConnectionUri {
    fn into_connection_uri(self) -> MrResult<MongoConnectionUri>;
}

impl IntoConnectionUri for &str {
    fn into_connection_uri(self) -> MrResult<MongoConnectionUri> {
        MongoConnectionUri::parse(self)
    }
}

impl IntoConnectionUri for String {
    fn into_connection_uri(self) -> MrResult<MongoConnectionUri> {
        MongoConnectionUri::parse(&self)
    }
}

impl IntoConnectionUri for &String {
    fn into_connection_uri(self) -> MrResult<MongoConnectionUri> {
        MongoConnectionUri::parse(self)
    }
}

impl IntoConnectionUri for MongoConnectionUri {
    fn into_connection_uri(self) -> MrResult<MongoConnectionUri> {
        Ok(self)
    }
}

impl IntoConnectionUri for &MongoConnectionUri {
    fn into_connection_uri(self) -> MrResult<MongoConnectionUri> {
        Ok(self.clone())
    }
}

impl fmt::Display for MongoConnectionUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        if let Some(user) = self.username() {
            match self.password() {
                Some(_) => write!(f, "{}:****@", user)?,
                None => write!(f, "{}@", user)?,
            }
        }
        write!(f, "{}/{}", self.hosts().join(","), self.namespace())?;
        if let Some(options) = &self.options {
            write!(f, "?{}", options)?;
        }
        Ok(())
    }
}

impl fmt::Debug for MongoConnectionUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MongoConnectionUri({})", self)
    }
}
