//! `members list|show|add|edit|delete`.

use clap::{Args, Subcommand};
use prettytable::row;

use super::Outcome;
use crate::output::{
    print_details, print_form_errors, print_json, print_notice, print_page_footer,
    table_with_header,
};
use libris_client::views::catalog::{self, empty_text, EditMode, NO_MEMBERS_TEXT};
use libris_client::views::TableState;
use libris_client::{ClientError, ClientResult, Library};
use libris_core::dates::display_date;
use libris_core::{Member, MemberForm, MemberId, MemberType};

#[derive(Subcommand, Debug)]
pub enum MembersCommand {
    /// List members, filtered locally
    List {
        /// Matches name or email
        #[arg(long, short)]
        search: Option<String>,

        #[arg(long, short, default_value_t = 1)]
        page: usize,
    },

    /// Show one member
    Show { id: MemberId },

    /// Register a member
    Add(MemberFields),

    /// Edit a member; omitted fields keep their value
    Edit {
        id: MemberId,

        #[command(flatten)]
        fields: MemberFields,
    },

    /// Delete a member
    Delete { id: MemberId },
}

#[derive(Args, Debug, Default)]
pub struct MemberFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    /// STUDENT, FACULTY or STAFF
    #[arg(long = "type")]
    pub member_type: Option<MemberType>,
}

impl MemberFields {
    pub fn apply(self, mut form: MemberForm) -> MemberForm {
        if let Some(v) = self.name {
            form.name = v;
        }
        if let Some(v) = self.email {
            form.email = v;
        }
        if let Some(v) = self.phone {
            form.phone = v;
        }
        if let Some(v) = self.member_type {
            form.member_type = v;
        }
        form
    }
}

pub async fn run(library: &Library, cmd: MembersCommand, json: bool) -> ClientResult<Outcome> {
    match cmd {
        MembersCommand::List { search, page } => {
            let members = library.members().await?;
            let mut state = TableState::new();
            state.set_query(search.unwrap_or_default());
            state.go_to(page);
            let page = state.member_page(&members);

            if json {
                print_json(&page.items)?;
                return Ok(Outcome::Done);
            }
            print_members(&page.items);
            if let Some(text) = empty_text(&page, NO_MEMBERS_TEXT) {
                println!("{}", text);
            }
            print_page_footer(&page);
        }

        MembersCommand::Show { id } => {
            let member = library
                .member(id)
                .await?
                .ok_or_else(|| ClientError::not_found("Member not found"))?;
            if json {
                print_json(&member)?;
            } else {
                print_member(&member);
            }
        }

        MembersCommand::Add(fields) => {
            let form = fields.apply(MemberForm::default());
            return save(library, EditMode::Create, &form, json).await;
        }

        MembersCommand::Edit { id, fields } => {
            let member = library
                .member(id)
                .await?
                .ok_or_else(|| ClientError::not_found("Member not found"))?;
            let form = fields.apply(MemberForm::from(&member));
            return save(library, EditMode::Edit(id), &form, json).await;
        }

        MembersCommand::Delete { id } => {
            let notice = catalog::delete_member(library, id).await;
            print_notice(&notice, json)?;
            return Ok(Outcome::from_notice(&notice));
        }
    }
    Ok(Outcome::Done)
}

async fn save(
    library: &Library,
    mode: EditMode<MemberId>,
    form: &MemberForm,
    json: bool,
) -> ClientResult<Outcome> {
    match catalog::save_member(library, mode, form).await {
        Ok(notice) => {
            print_notice(&notice, json)?;
            Ok(Outcome::from_notice(&notice))
        }
        Err(errors) => {
            print_form_errors(&errors);
            Ok(Outcome::Failed)
        }
    }
}

fn print_members(members: &[Member]) {
    if members.is_empty() {
        return;
    }
    let mut table = table_with_header(&["ID", "Name", "Email", "Phone", "Type", "Since", "Active"]);
    for m in members {
        table.add_row(row![
            m.id,
            m.name,
            m.email,
            m.phone,
            m.member_type,
            display_date(&m.membership_date),
            if m.active { "yes" } else { "no" }
        ]);
    }
    table.printstd();
}

fn print_member(member: &Member) {
    print_details(&[
        ("ID", member.id.to_string()),
        ("Name", member.name.clone()),
        ("Email", member.email.clone()),
        ("Phone", member.phone.clone()),
        ("Type", member.member_type.to_string()),
        ("Member since", display_date(&member.membership_date)),
        ("Active", member.active.to_string()),
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_changes_only_given_fields() {
        let base = MemberForm {
            name: "Bob".into(),
            email: "bob@uni.edu".into(),
            phone: "555-0101".into(),
            member_type: MemberType::Student,
        };
        let fields = MemberFields {
            member_type: Some(MemberType::Faculty),
            ..Default::default()
        };
        let form = fields.apply(base);
        assert_eq!(form.email, "bob@uni.edu");
        assert_eq!(form.member_type, MemberType::Faculty);
    }
}
