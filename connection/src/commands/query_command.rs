use crate::commands::COM_QUERY;

#[derive(Debug)]
pub struct QueryCommand {
    sql: String,
}

impl QueryCommand {
    pub fn new(sql: String) -> Self {
        QueryCommand { sql }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(1 + self.sql.len());
        packet.push(COM_QUERY);
        packet.extend_from_slice(self.sql.as_bytes());
        packet
    }
}

#[cfg(test)]
mod test {
    use super::QueryCommand;

    #[test]
    fn serialize() {
        let p = QueryCommand::new("select 1".to_string()).serialize();
        assert_eq!(p[0], 0x03);
        assert_eq!(&p[1..], b"select 1");
    }
}
