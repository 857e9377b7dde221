//! Recipient key storage with encryption at rest
//!
//! Uses AES-256-GCM for encryption and Argon2id for key derivation.
//! The private key is never written in plaintext; the public key is kept in
//! the clear so it can be shown and registered without a password.

use std::fs;
use std::path::PathBuf;

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, bail, Context, Result};
use argon2::{
    password_hash::{rand_core::RngCore, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use serde::{Deserialize, Serialize};
use stealth_deposit::{KeyPair, PublicKey};
use zeroize::Zeroize;

/// Argon2 parameters for key derivation
const ARGON2_M_COST: u32 = 65536; // 64 MB memory
const ARGON2_T_COST: u32 = 3;
const ARGON2_P_COST: u32 = 4;

const FILE_VERSION: u8 = 1;

/// Non-interactive password source, checked before prompting
pub const PASSWORD_ENV: &str = "STEALTHDEP_PASSWORD";

/// Encrypted key file format
#[derive(Serialize, Deserialize)]
pub struct EncryptedKeyFile {
    pub version: u8,
    /// Recipient public key (hex), stored in the clear
    pub public_key: String,
    /// Salt for Argon2
    pub salt: String,
    /// Nonce for AES-GCM (base64)
    pub nonce: String,
    /// Encrypted private key (base64)
    pub ciphertext: String,
    /// Argon2 PHC string used to tell a wrong password from corruption
    pub password_hash: Option<String>,
    /// Whether the key can be rebuilt from a recovery phrase
    #[serde(default)]
    pub recoverable: bool,
    pub created_at: String,
}

/// Decrypted key material (internal use only)
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct KeyData {
    pub secret: [u8; 32],
}

impl KeyData {
    pub fn from_keypair(keys: &KeyPair) -> Self {
        Self {
            secret: keys.export_secret(),
        }
    }

    pub fn to_keypair(&self) -> Result<KeyPair> {
        KeyPair::from_secret_bytes(&self.secret).context("Stored private key is invalid")
    }
}

fn argon2() -> Result<Argon2<'static>> {
    let params = argon2::Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(32))
        .map_err(|e| anyhow!("Argon2 params error: {}", e))?;
    Ok(Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params))
}

fn derive_cipher(argon2: &Argon2<'_>, password: &str, salt: &str) -> Result<Aes256Gcm> {
    let mut key_bytes = [0u8; 32];
    argon2
        .hash_password_into(password.as_bytes(), salt.as_bytes(), &mut key_bytes)
        .map_err(|e| anyhow!("Key derivation failed: {}", e))?;

    let cipher = Aes256Gcm::new_from_slice(&key_bytes).map_err(|e| anyhow!("Cipher creation failed: {}", e));
    key_bytes.zeroize();
    cipher
}

impl EncryptedKeyFile {
    /// Encrypt a key pair under `password`.
    pub fn encrypt(keys: &KeyPair, password: &str, recoverable: bool) -> Result<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = argon2()?;
        let cipher = derive_cipher(&argon2, password, salt.as_str())?;

        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);

        let data = KeyData::from_keypair(keys);
        let ciphertext = cipher
            .encrypt(&Nonce::from(nonce_bytes), &data.secret[..])
            .map_err(|e| anyhow!("Encryption failed: {}", e))?;

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .ok()
            .map(|h| h.to_string());

        Ok(Self {
            version: FILE_VERSION,
            public_key: keys.public_key().to_hex(),
            salt: salt.as_str().to_string(),
            nonce: b64::encode(&nonce_bytes),
            ciphertext: b64::encode(&ciphertext),
            password_hash,
            recoverable,
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Decrypt with `password` and rebuild the key pair.
    ///
    /// The rebuilt public key must match the one stored in the clear.
    pub fn decrypt(&self, password: &str) -> Result<KeyPair> {
        if self.version != FILE_VERSION {
            bail!("Unsupported key file version {}", self.version);
        }

        if let Some(ref hash) = self.password_hash {
            let parsed_hash =
                argon2::PasswordHash::new(hash).map_err(|e| anyhow!("Invalid password hash: {}", e))?;
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .map_err(|_| anyhow!("Invalid password"))?;
        }

        let cipher = derive_cipher(&argon2()?, password, &self.salt)?;

        let nonce_array: [u8; 12] = b64::decode(&self.nonce)
            .context("Invalid nonce encoding")?
            .try_into()
            .map_err(|_| anyhow!("Invalid nonce length"))?;
        let ciphertext = b64::decode(&self.ciphertext).context("Invalid ciphertext encoding")?;

        let mut plaintext = cipher
            .decrypt(&Nonce::from(nonce_array), ciphertext.as_slice())
            .map_err(|_| anyhow!("Decryption failed - wrong password or corrupted data"))?;

        let mut data = KeyData { secret: [0u8; 32] };
        if plaintext.len() != data.secret.len() {
            plaintext.zeroize();
            bail!("Decrypted key has the wrong length");
        }
        data.secret.copy_from_slice(&plaintext);
        plaintext.zeroize();

        let keys = data.to_keypair()?;
        if keys.public_key().to_hex() != self.public_key {
            bail!("Stored public key does not match the decrypted private key");
        }
        Ok(keys)
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_hex(&self.public_key).context("Stored public key is invalid")
    }
}

/// Encrypted key file on disk
pub struct SecureKeyStorage {
    path: PathBuf,
}

impl SecureKeyStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn save(&self, keys: &KeyPair, password: &str, recoverable: bool) -> Result<()> {
        let encrypted = EncryptedKeyFile::encrypt(keys, password, recoverable)?;
        let json = serde_json::to_string_pretty(&encrypted)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write with restrictive permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::write(&self.path, &json)?;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, &json)?;
        }

        Ok(())
    }

    /// Read the file without decrypting it.
    pub fn read(&self) -> Result<EncryptedKeyFile> {
        if !self.exists() {
            bail!("No recipient key found. Run 'stealthdep keygen' first.");
        }
        let json = fs::read_to_string(&self.path).context("Failed to read encrypted key file")?;
        serde_json::from_str(&json).context("Failed to parse encrypted key file")
    }

    pub fn load(&self, password: &str) -> Result<KeyPair> {
        self.read()?.decrypt(password)
    }

    /// Load, taking the password from the environment or a prompt.
    pub fn unlock(&self) -> Result<KeyPair> {
        let stored = self.read()?;
        let password = password_from_env_or_prompt("Enter password to decrypt keys: ")?;
        stored.decrypt(&password).context("Failed to decrypt keys. Wrong password?")
    }
}

/// Password strength validation
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.len() < 8 {
        bail!("Password must be at least 8 characters");
    }

    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_numeric());

    if !has_upper || !has_lower || !has_digit {
        bail!("Password must contain uppercase, lowercase, and numeric characters");
    }

    Ok(())
}

/// Prompt for password securely (hides input)
pub fn prompt_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("Failed to read password")
}

pub fn password_from_env_or_prompt(prompt: &str) -> Result<String> {
    match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => Ok(password),
        _ => prompt_password(prompt),
    }
}

/// Prompt for a new password with confirmation
pub fn prompt_new_password(prompt: &str) -> Result<String> {
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => password,
        _ => {
            let password = prompt_password(prompt)?;
            let confirm = prompt_password("Confirm password: ")?;
            if password != confirm {
                bail!("Passwords do not match");
            }
            password
        }
    };

    validate_password_strength(&password)?;
    Ok(password)
}

mod b64 {
    use base64::{engine::general_purpose::STANDARD, Engine};

    pub fn encode(data: &[u8]) -> String {
        STANDARD.encode(data)
    }

    pub fn decode(s: &str) -> anyhow::Result<Vec<u8>> {
        STANDARD
            .decode(s)
            .map_err(|e| anyhow::anyhow!("Base64 decode error: {}", e))
    }
}
