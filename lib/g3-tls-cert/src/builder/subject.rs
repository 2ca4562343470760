/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use openssl::error::ErrorStack;
use openssl::nid::Nid;
use openssl::x509::X509Name;

#[derive(Default)]
pub struct SubjectNameBuilder {
    organization: Option<String>,
    common_name: Option<String>,
}

impl SubjectNameBuilder {
    pub fn set_organization(&mut self, o: String) {
        self.organization = Some(o);
    }

    pub fn set_common_name(&mut self, cn: String) {
        self.common_name = Some(cn);
    }

    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    pub fn build(&self) -> Result<X509Name, ErrorStack> {
        let mut builder = X509Name::builder()?;
        if let Some(o) = &self.organization {
            builder.append_entry_by_nid(Nid::ORGANIZATIONNAME, o)?;
        }
        if let Some(cn) = &self.common_name {
            if !cn.is_empty() {
                builder.append_entry_by_nid(Nid::COMMONNAME, cn)?;
            }
        }
        Ok(builder.build())
    }
}
