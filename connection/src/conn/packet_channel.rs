use std::fs::File;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::{fmt, io, net};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use native_tls::{Certificate, TlsConnector};

use common::config::TlsConfig;
use common::err::replica_error::ReError;
use common::err::CResult;

use crate::conn::connection_options::ConnectionOptions;
use crate::{PACKET_HEADER_SIZE, TIMEOUT_LATENCY_DELTA};

/// Length-prefixed MySQL packet framing over TCP, upgradeable to TLS.
pub struct PacketChannel {
    stream: ChannelStream,
}

impl PacketChannel {
    pub fn new(options: &ConnectionOptions) -> CResult<Self> {
        let stream = match &options.dialer {
            Some(dialer) => (dialer.0)(&options.hostname, options.port)?,
            None => {
                let address = format!("{}:{}", options.hostname, options.port);
                let addr = address.to_socket_addrs()?.next().ok_or_else(|| {
                    ReError::ConnectionError(format!("cannot resolve {}", address))
                })?;
                TcpStream::connect_timeout(&addr, crate::CONNECT_TIMEOUT)?
            }
        };

        // heartbeats must arrive inside the read timeout or the socket is
        // considered dead
        let read_timeout = match options.read_timeout {
            Some(t) => Some(t),
            None if !options.heartbeat_period.is_zero() => {
                Some(options.heartbeat_period + TIMEOUT_LATENCY_DELTA)
            }
            None => None,
        };
        stream.set_read_timeout(read_timeout)?;

        Ok(Self {
            stream: ChannelStream::Tcp(stream),
        })
    }

    pub fn is_ssl(&self) -> bool {
        matches!(self.stream, ChannelStream::Tls(_))
    }

    pub fn read_packet(&mut self) -> CResult<(Vec<u8>, u8)> {
        let mut header_buffer = [0; PACKET_HEADER_SIZE];
        self.stream.read_exact(&mut header_buffer)?;
        let packet_size = (&header_buffer[0..3]).read_u24::<LittleEndian>()?;
        let seq_num = header_buffer[3];

        let mut packet: Vec<u8> = vec![0; packet_size as usize];
        self.stream.read_exact(&mut packet)?;

        Ok((packet, seq_num))
    }

    pub fn write_packet(&mut self, packet: &[u8], seq_num: u8) -> CResult<()> {
        self.stream.write_u24::<LittleEndian>(packet.len() as u32)?;
        self.stream.write_u8(seq_num)?;
        self.stream.write_all(packet)?;
        self.stream.flush()?;
        Ok(())
    }

    pub fn shutdown(&mut self) -> io::Result<()> {
        self.stream.shutdown()
    }

    pub fn upgrade_to_ssl(self, hostname: &str, tls: &TlsConfig) -> CResult<Self> {
        let mut builder = TlsConnector::builder();

        if let Some(root_cert_path) = &tls.root_cert_path {
            let mut root_cert_data = vec![];
            File::open(root_cert_path)?.read_to_end(&mut root_cert_data)?;

            let root_certs = Certificate::from_der(&root_cert_data)
                .map(|x| vec![x])
                .or_else(|_| {
                    pem::parse_many(&*root_cert_data)
                        .unwrap_or_default()
                        .iter()
                        .map(pem::encode)
                        .map(|s| Certificate::from_pem(s.as_bytes()))
                        .collect()
                })
                .map_err(|err| {
                    ReError::ConnectionError(format!("cannot load tls root cert: {err}"))
                })?;

            for root_cert in root_certs {
                builder.add_root_certificate(root_cert);
            }
        }
        builder.danger_accept_invalid_hostnames(tls.skip_domain_validation);
        builder.danger_accept_invalid_certs(tls.accept_invalid_certs);

        let tls_connector = builder
            .build()
            .map_err(|err| ReError::ConnectionError(format!("cannot build tls: {err}")))?;

        match self.stream {
            ChannelStream::Tcp(tcp_stream) => {
                let secure_stream = tls_connector
                    .connect(hostname, tcp_stream)
                    .map_err(|err| ReError::ConnectionError(format!("tls connect: {err}")))?;
                Ok(Self {
                    stream: ChannelStream::Tls(Box::new(secure_stream)),
                })
            }
            ChannelStream::Tls(_) => Ok(self),
        }
    }
}

enum ChannelStream {
    Tls(Box<native_tls::TlsStream<net::TcpStream>>),
    Tcp(net::TcpStream),
}

impl ChannelStream {
    fn shutdown(&mut self) -> io::Result<()> {
        match self {
            ChannelStream::Tcp(stream) => stream.shutdown(Shutdown::Both),
            ChannelStream::Tls(stream) => stream.shutdown(),
        }
    }
}

impl Write for ChannelStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ChannelStream::Tcp(stream) => stream.write(buf),
            ChannelStream::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ChannelStream::Tcp(stream) => stream.flush(),
            ChannelStream::Tls(stream) => stream.flush(),
        }
    }
}

impl Read for ChannelStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ChannelStream::Tcp(stream) => stream.read(buf),
            ChannelStream::Tls(stream) => stream.read(buf),
        }
    }
}

impl fmt::Debug for PacketChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stream {
            ChannelStream::Tcp(ref s) => write!(f, "Tcp stream {:?}", s),
            ChannelStream::Tls(ref s) => write!(f, "Tls stream {:?}", s),
        }
    }
}
